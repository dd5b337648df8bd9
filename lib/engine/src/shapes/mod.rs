//! User-facing definitions of [SHACL](https://www.w3.org/TR/shacl/) shapes.
//!
//! The same definitions are produced by constraint inference and authored by users. They can be
//! turned into triples ([shape_triples]) or rendered to Turtle text ([serialize_shape]).

mod serializer;
mod triples;

pub use serializer::{serialize_shape, turtle_string};
pub use triples::{property_shape_triples, shape_triples, write_list};

use cubelink_model::vocab::{sh, xsd};
use cubelink_model::{NamedNodeRef, Term};
use serde::{Deserialize, Serialize};

/// The kind of RDF term that values of a property must be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "IRI")]
    Iri,
    Literal,
    BlankNode,
    #[serde(rename = "BlankNodeOrIRI")]
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    #[serde(rename = "IRIOrLiteral")]
    IriOrLiteral,
}

impl NodeKind {
    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            NodeKind::Iri => sh::IRI,
            NodeKind::Literal => sh::LITERAL,
            NodeKind::BlankNode => sh::BLANK_NODE,
            NodeKind::BlankNodeOrIri => sh::BLANK_NODE_OR_IRI,
            NodeKind::BlankNodeOrLiteral => sh::BLANK_NODE_OR_LITERAL,
            NodeKind::IriOrLiteral => sh::IRI_OR_LITERAL,
        }
    }

    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        [
            NodeKind::Iri,
            NodeKind::Literal,
            NodeKind::BlankNode,
            NodeKind::BlankNodeOrIri,
            NodeKind::BlankNodeOrLiteral,
            NodeKind::IriOrLiteral,
        ]
        .into_iter()
        .find(|kind| kind.iri() == iri)
    }
}

/// The severity of a validation result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Violation,
    Warning,
    Info,
}

impl Severity {
    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            Severity::Violation => sh::VIOLATION,
            Severity::Warning => sh::WARNING,
            Severity::Info => sh::INFO,
        }
    }

    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        [Severity::Violation, Severity::Warning, Severity::Info]
            .into_iter()
            .find(|severity| severity.iri() == iri)
    }
}

/// A constant value used in a shape (`sh:in`, `sh:hasValue`, numeric bounds).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeValue {
    Iri(String),
    Literal {
        value: String,
        #[serde(default)]
        datatype: Option<String>,
        #[serde(default)]
        language: Option<String>,
    },
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
}

impl ShapeValue {
    /// Creates a literal without datatype or language.
    pub fn string(value: impl Into<String>) -> Self {
        ShapeValue::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Creates a literal with the given datatype.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        ShapeValue::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// Converts an IRI or literal into a shape constant. Blank nodes have no constant form.
    ///
    /// `xsd:string` literals become plain literals and language tags are kept.
    pub fn from_term(term: &Term) -> Option<Self> {
        match term {
            Term::NamedNode(node) => Some(ShapeValue::Iri(node.as_str().to_owned())),
            Term::Literal(literal) => Some(match literal.language() {
                Some(language) => ShapeValue::Literal {
                    value: literal.value().to_owned(),
                    datatype: None,
                    language: Some(language.to_owned()),
                },
                None if literal.datatype() == xsd::STRING => ShapeValue::string(literal.value()),
                None => ShapeValue::typed(literal.value(), literal.datatype().as_str()),
            }),
            _ => None,
        }
    }
}

/// The nodes a shape applies to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeTarget {
    Class(String),
    Node(String),
}

/// A property shape. Every populated field is rendered exactly once.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyShapeDefinition {
    pub path: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub datatype: Option<String>,
    pub node_kind: Option<NodeKind>,
    pub class: Option<String>,
    pub min_count: Option<u64>,
    pub max_count: Option<u64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub flags: Option<String>,
    pub min_inclusive: Option<ShapeValue>,
    pub max_inclusive: Option<ShapeValue>,
    pub min_exclusive: Option<ShapeValue>,
    pub max_exclusive: Option<ShapeValue>,
    #[serde(rename = "in")]
    pub in_values: Vec<ShapeValue>,
    pub has_value: Option<ShapeValue>,
    pub node: Option<String>,
    pub message: Option<String>,
    pub severity: Option<Severity>,
    pub order: Option<i64>,
}

impl PropertyShapeDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// A node shape with its property shapes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeDefinition {
    pub iri: String,
    /// Classes asserted on the shape in addition to `sh:NodeShape`.
    pub types: Vec<String>,
    pub target: Option<ShapeTarget>,
    pub closed: Option<bool>,
    pub ignored_properties: Vec<String>,
    pub properties: Vec<PropertyShapeDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_user_definitions() -> Result<(), serde_json::Error> {
        let shape: ShapeDefinition = serde_json::from_str(
            r#"{
                "iri": "http://example.com/shape",
                "target": { "class": "http://example.com/City" },
                "closed": true,
                "properties": [{
                    "path": "http://example.com/name",
                    "nodeKind": "IRI",
                    "minCount": 1,
                    "in": [{ "iri": "http://example.com/a" }, { "integer": 3 }],
                    "severity": "Warning"
                }]
            }"#,
        )?;

        assert_eq!(
            shape.target,
            Some(ShapeTarget::Class("http://example.com/City".to_owned()))
        );
        let property = &shape.properties[0];
        assert_eq!(property.node_kind, Some(NodeKind::Iri));
        assert_eq!(property.min_count, Some(1));
        assert_eq!(
            property.in_values,
            vec![
                ShapeValue::Iri("http://example.com/a".to_owned()),
                ShapeValue::Integer(3)
            ]
        );
        assert_eq!(property.severity, Some(Severity::Warning));
        Ok(())
    }
}
