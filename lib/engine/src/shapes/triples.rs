use crate::shapes::serializer::decimal_lexical;
use crate::shapes::{PropertyShapeDefinition, ShapeDefinition, ShapeTarget, ShapeValue};
use cubelink_model::vocab::{rdf, sh, xsd};
use cubelink_model::{BlankNode, CubeError, CubeGraph, Literal, NamedNode, Subject, Term};

const OPERATION: &str = "shape-triples";

/// Builds the triples of a node shape and its property shapes.
///
/// Property shapes become fresh blank nodes linked via `sh:property`.
pub fn shape_triples(shape: &ShapeDefinition) -> Result<CubeGraph, CubeError> {
    let mut graph = CubeGraph::new();
    let node = Subject::from(named_node(&shape.iri)?);

    graph.add(node.clone(), rdf::TYPE, sh::NODE_SHAPE.into_owned());
    for class in &shape.types {
        graph.add(node.clone(), rdf::TYPE, named_node(class)?);
    }
    match &shape.target {
        Some(ShapeTarget::Class(class)) => {
            graph.add(node.clone(), sh::TARGET_CLASS, named_node(class)?);
        }
        Some(ShapeTarget::Node(target)) => {
            graph.add(node.clone(), sh::TARGET_NODE, named_node(target)?);
        }
        None => {}
    }
    if let Some(closed) = shape.closed {
        graph.add(node.clone(), sh::CLOSED, Literal::from(closed));
    }
    if !shape.ignored_properties.is_empty() {
        let properties = shape
            .ignored_properties
            .iter()
            .map(|property| named_node(property).map(Term::from))
            .collect::<Result<Vec<_>, _>>()?;
        let list = write_list(&mut graph, properties);
        graph.add(node.clone(), sh::IGNORED_PROPERTIES, list);
    }
    for property in &shape.properties {
        property_shape_triples(&mut graph, &node, property)?;
    }
    Ok(graph)
}

/// Adds a property shape to `graph` and links it to `shape` via `sh:property`.
///
/// Returns the blank node of the property shape.
pub fn property_shape_triples(
    graph: &mut CubeGraph,
    shape: &Subject,
    property: &PropertyShapeDefinition,
) -> Result<BlankNode, CubeError> {
    let node = BlankNode::default();
    graph.add(shape.clone(), sh::PROPERTY, node.clone());

    let subject = Subject::from(node.clone());
    graph.add(subject.clone(), sh::PATH, named_node(&property.path)?);
    if let Some(name) = &property.name {
        graph.add(subject.clone(), sh::NAME, Literal::new_simple_literal(name));
    }
    if let Some(description) = &property.description {
        graph.add(
            subject.clone(),
            sh::DESCRIPTION,
            Literal::new_simple_literal(description),
        );
    }
    if let Some(datatype) = &property.datatype {
        graph.add(subject.clone(), sh::DATATYPE, named_node(datatype)?);
    }
    if let Some(node_kind) = property.node_kind {
        graph.add(subject.clone(), sh::NODE_KIND, node_kind.iri().into_owned());
    }
    if let Some(class) = &property.class {
        graph.add(subject.clone(), sh::CLASS, named_node(class)?);
    }
    for (predicate, count) in [
        (sh::MIN_COUNT, property.min_count),
        (sh::MAX_COUNT, property.max_count),
        (sh::MIN_LENGTH, property.min_length),
        (sh::MAX_LENGTH, property.max_length),
    ] {
        if let Some(count) = count {
            graph.add(
                subject.clone(),
                predicate,
                Literal::new_typed_literal(count.to_string(), xsd::INTEGER),
            );
        }
    }
    if let Some(pattern) = &property.pattern {
        graph.add(subject.clone(), sh::PATTERN, Literal::new_simple_literal(pattern));
    }
    if let Some(flags) = &property.flags {
        graph.add(subject.clone(), sh::FLAGS, Literal::new_simple_literal(flags));
    }
    for (predicate, bound) in [
        (sh::MIN_INCLUSIVE, &property.min_inclusive),
        (sh::MAX_INCLUSIVE, &property.max_inclusive),
        (sh::MIN_EXCLUSIVE, &property.min_exclusive),
        (sh::MAX_EXCLUSIVE, &property.max_exclusive),
    ] {
        if let Some(bound) = bound {
            graph.add(subject.clone(), predicate, shape_value_term(bound)?);
        }
    }
    if !property.in_values.is_empty() {
        let values = property
            .in_values
            .iter()
            .map(shape_value_term)
            .collect::<Result<Vec<_>, _>>()?;
        let list = write_list(graph, values);
        graph.add(subject.clone(), sh::IN, list);
    }
    if let Some(has_value) = &property.has_value {
        graph.add(subject.clone(), sh::HAS_VALUE, shape_value_term(has_value)?);
    }
    if let Some(shape) = &property.node {
        graph.add(subject.clone(), sh::NODE, named_node(shape)?);
    }
    if let Some(message) = &property.message {
        graph.add(subject.clone(), sh::MESSAGE, Literal::new_simple_literal(message));
    }
    if let Some(severity) = property.severity {
        graph.add(subject.clone(), sh::SEVERITY, severity.iri().into_owned());
    }
    if let Some(order) = property.order {
        graph.add(subject, sh::ORDER, Literal::from(order));
    }
    Ok(node)
}

/// Writes `items` as an RDF collection and returns its head.
///
/// An empty collection is `rdf:nil`.
pub fn write_list(graph: &mut CubeGraph, items: Vec<Term>) -> Term {
    let mut head = Term::from(rdf::NIL.into_owned());
    for item in items.into_iter().rev() {
        let cell = BlankNode::default();
        graph.add(cell.clone(), rdf::FIRST, item);
        graph.add(cell.clone(), rdf::REST, head);
        head = cell.into();
    }
    head
}

/// Converts a shape constant into an RDF term.
pub(crate) fn shape_value_term(value: &ShapeValue) -> Result<Term, CubeError> {
    Ok(match value {
        ShapeValue::Iri(iri) => named_node(iri)?.into(),
        ShapeValue::Literal {
            value,
            datatype: Some(datatype),
            ..
        } => Literal::new_typed_literal(value, named_node(datatype)?).into(),
        ShapeValue::Literal {
            value,
            language: Some(language),
            ..
        } => Literal::new_language_tagged_literal(value, language)
            .map_err(|error| CubeError::InvalidPathArgument {
                operation: OPERATION,
                argument: language.clone(),
                message: error.to_string(),
            })?
            .into(),
        ShapeValue::Literal { value, .. } => Literal::new_simple_literal(value).into(),
        ShapeValue::Integer(value) => Literal::from(*value).into(),
        ShapeValue::Decimal(value) if value.is_finite() => {
            Literal::new_typed_literal(decimal_lexical(*value), xsd::DECIMAL).into()
        }
        ShapeValue::Decimal(value) => Literal::from(*value).into(),
        ShapeValue::Boolean(value) => Literal::from(*value).into(),
    })
}

fn named_node(iri: &str) -> Result<NamedNode, CubeError> {
    NamedNode::new(iri).map_err(|error| CubeError::invalid_iri(OPERATION, iri, &error))
}
