//! Turtle rendering of [ShapeDefinition]s.
//!
//! The rendering is mechanical: each populated field is written once, in a fixed order, and no
//! inference takes place.

use crate::shapes::{PropertyShapeDefinition, ShapeDefinition, ShapeTarget, ShapeValue};
use cubelink_model::{local_name, CubeError, Literal, NamedNode};

const OPERATION: &str = "serialize-shape";

/// Renders a shape definition as a Turtle document.
///
/// # Errors
///
/// Returns [CubeError::InvalidPathArgument] if one of the IRIs in the definition is invalid.
pub fn serialize_shape(shape: &ShapeDefinition) -> Result<String, CubeError> {
    let mut out = String::with_capacity(1024);
    out.push_str("@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .\n");
    out.push_str("@prefix sh: <http://www.w3.org/ns/shacl#> .\n");
    out.push_str("@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\n");

    let mut types = vec!["sh:NodeShape".to_owned()];
    for class in &shape.types {
        types.push(iri(class)?);
    }

    let mut statements = vec![format!("a {}", types.join(", "))];
    match &shape.target {
        Some(ShapeTarget::Class(class)) => {
            statements.push(format!("sh:targetClass {}", iri(class)?));
        }
        Some(ShapeTarget::Node(node)) => {
            statements.push(format!("sh:targetNode {}", iri(node)?));
        }
        None => {}
    }
    if let Some(closed) = shape.closed {
        statements.push(format!("sh:closed {closed}"));
    }
    if !shape.ignored_properties.is_empty() {
        let properties = shape
            .ignored_properties
            .iter()
            .map(|property| iri(property))
            .collect::<Result<Vec<_>, _>>()?;
        statements.push(format!("sh:ignoredProperties ( {} )", properties.join(" ")));
    }
    for property in &shape.properties {
        statements.push(format!("sh:property {}", property_block(property)?));
    }

    out.push_str(&iri(&shape.iri)?);
    out.push_str("\n    ");
    out.push_str(&statements.join(" ;\n    "));
    out.push_str(" .\n");
    Ok(out)
}

/// Renders a property shape as a Turtle blank node property list.
fn property_block(property: &PropertyShapeDefinition) -> Result<String, CubeError> {
    let mut lines = vec![format!("sh:path {}", iri(&property.path)?)];
    if let Some(name) = &property.name {
        lines.push(format!("sh:name {}", turtle_string(name)));
    }
    if let Some(description) = &property.description {
        lines.push(format!("sh:description {}", turtle_string(description)));
    }
    if let Some(datatype) = &property.datatype {
        lines.push(format!("sh:datatype {}", iri(datatype)?));
    }
    if let Some(node_kind) = property.node_kind {
        lines.push(format!("sh:nodeKind sh:{}", local_name(node_kind.iri().as_str())));
    }
    if let Some(class) = &property.class {
        lines.push(format!("sh:class {}", iri(class)?));
    }
    if let Some(min_count) = property.min_count {
        lines.push(format!("sh:minCount {min_count}"));
    }
    if let Some(max_count) = property.max_count {
        lines.push(format!("sh:maxCount {max_count}"));
    }
    if let Some(min_length) = property.min_length {
        lines.push(format!("sh:minLength {min_length}"));
    }
    if let Some(max_length) = property.max_length {
        lines.push(format!("sh:maxLength {max_length}"));
    }
    if let Some(pattern) = &property.pattern {
        lines.push(format!("sh:pattern {}", turtle_string(pattern)));
    }
    if let Some(flags) = &property.flags {
        lines.push(format!("sh:flags {}", turtle_string(flags)));
    }
    for (predicate, bound) in [
        ("sh:minInclusive", &property.min_inclusive),
        ("sh:maxInclusive", &property.max_inclusive),
        ("sh:minExclusive", &property.min_exclusive),
        ("sh:maxExclusive", &property.max_exclusive),
    ] {
        if let Some(bound) = bound {
            lines.push(format!("{predicate} {}", value(bound)?));
        }
    }
    if !property.in_values.is_empty() {
        let values = property
            .in_values
            .iter()
            .map(value)
            .collect::<Result<Vec<_>, _>>()?;
        lines.push(format!("sh:in ( {} )", values.join(" ")));
    }
    if let Some(has_value) = &property.has_value {
        lines.push(format!("sh:hasValue {}", value(has_value)?));
    }
    if let Some(node) = &property.node {
        lines.push(format!("sh:node {}", iri(node)?));
    }
    if let Some(message) = &property.message {
        lines.push(format!("sh:message {}", turtle_string(message)));
    }
    if let Some(severity) = property.severity {
        lines.push(format!("sh:severity sh:{}", local_name(severity.iri().as_str())));
    }
    if let Some(order) = property.order {
        lines.push(format!("sh:order {order}"));
    }
    Ok(format!("[\n        {}\n    ]", lines.join(" ;\n        ")))
}

fn iri(value: &str) -> Result<String, CubeError> {
    let node = NamedNode::new(value)
        .map_err(|error| CubeError::invalid_iri(OPERATION, value, &error))?;
    Ok(node.to_string())
}

fn value(value: &ShapeValue) -> Result<String, CubeError> {
    Ok(match value {
        ShapeValue::Iri(node) => iri(node)?,
        ShapeValue::Literal {
            value,
            datatype: Some(datatype),
            ..
        } => format!("{}^^{}", turtle_string(value), iri(datatype)?),
        ShapeValue::Literal {
            value,
            language: Some(language),
            ..
        } => format!("{}@{}", turtle_string(value), language_tag(value, language)?),
        ShapeValue::Literal { value, .. } => turtle_string(value),
        ShapeValue::Integer(value) => value.to_string(),
        ShapeValue::Decimal(value) if value.is_finite() => {
            format!("\"{}\"^^xsd:decimal", decimal_lexical(*value))
        }
        ShapeValue::Decimal(value) if value.is_nan() => "\"NaN\"^^xsd:double".to_owned(),
        ShapeValue::Decimal(value) if *value > 0.0 => "\"INF\"^^xsd:double".to_owned(),
        ShapeValue::Decimal(_) => "\"-INF\"^^xsd:double".to_owned(),
        ShapeValue::Boolean(value) => value.to_string(),
    })
}

fn language_tag<'a>(value: &str, language: &'a str) -> Result<&'a str, CubeError> {
    Literal::new_language_tagged_literal(value, language).map_err(|error| {
        CubeError::InvalidPathArgument {
            operation: OPERATION,
            argument: language.to_owned(),
            message: error.to_string(),
        }
    })?;
    Ok(language)
}

pub(crate) fn decimal_lexical(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Escapes `value` and wraps it in double quotes.
///
/// ```
/// use cubelink_engine::shapes::turtle_string;
///
/// assert_eq!(turtle_string("say \"hi\"\n"), r#""say \"hi\"\n""#);
/// ```
pub fn turtle_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('"');
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}
