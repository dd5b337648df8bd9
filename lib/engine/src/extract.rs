//! Extraction of an existing constraint from a cube graph.

use crate::shapes::{NodeKind, PropertyShapeDefinition, Severity, ShapeValue};
use cubelink_model::vocab::{cube, sh};
use cubelink_model::{as_subject, CubeError, CubeGraph, NamedNodeRef, Subject, Term};
use indexmap::IndexSet;

const OPERATION: &str = "extract-constraint";

/// A constraint copied out of a larger graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedConstraint {
    pub constraint: Subject,
    /// The triples of the constraint and of all blank nodes reachable from it.
    pub graph: CubeGraph,
}

impl ExtractedConstraint {
    /// Reads the property shapes of the constraint.
    pub fn shapes(&self) -> Vec<PropertyShapeDefinition> {
        read_property_shapes(&self.graph, &self.constraint)
    }
}

/// Copies the observation constraint of `cube` out of `graph`.
///
/// Without a cube, the first subject typed as `cube:Constraint` is used.
///
/// # Errors
///
/// Returns [CubeError::NoConstraintFound] if there is no such constraint.
pub fn extract_constraint(
    graph: &CubeGraph,
    cube: Option<NamedNodeRef<'_>>,
) -> Result<ExtractedConstraint, CubeError> {
    let linked = cube.and_then(|cube| {
        graph
            .object_for_subject_predicate(&cube.into_owned().into(), cube::OBSERVATION_CONSTRAINT)
            .and_then(as_subject)
    });
    let constraint = linked
        .or_else(|| graph.subjects_with_type(cube::CONSTRAINT).into_iter().next())
        .ok_or(CubeError::NoConstraintFound {
            operation: OPERATION,
        })?;

    // Blank nodes are private to the constraint: property shapes, lists and nested values.
    let mut reachable = IndexSet::from([constraint.clone()]);
    let mut next = 0;
    while let Some(subject) = reachable.get_index(next).cloned() {
        next += 1;
        for triple in graph.triples_for_subject(&subject) {
            if let Term::BlankNode(node) = &triple.object {
                reachable.insert(node.clone().into());
            }
        }
    }
    let extracted = graph.subgraph(&reachable);
    if extracted.is_empty() {
        return Err(CubeError::NoConstraintFound {
            operation: OPERATION,
        });
    }

    tracing::debug!(
        constraint = %constraint,
        triples = extracted.len(),
        "Extracted constraint"
    );
    Ok(ExtractedConstraint {
        constraint,
        graph: extracted,
    })
}

/// Reads the property shapes linked from `shape`, ordered by `sh:order`.
///
/// Shapes without a path are skipped. Constants are read with [ShapeValue::from_term].
pub fn read_property_shapes(graph: &CubeGraph, shape: &Subject) -> Vec<PropertyShapeDefinition> {
    let mut shapes = graph
        .objects_for_subject_predicate(shape, sh::PROPERTY)
        .filter_map(as_subject)
        .filter_map(|node| read_property_shape(graph, &node))
        .collect::<Vec<_>>();
    shapes.sort_by_key(|shape| shape.order.unwrap_or(i64::MAX));
    shapes
}

fn read_property_shape(graph: &CubeGraph, node: &Subject) -> Option<PropertyShapeDefinition> {
    let object = |predicate| graph.object_for_subject_predicate(node, predicate);
    let iri = |predicate| match object(predicate) {
        Some(Term::NamedNode(node)) => Some(node.as_str().to_owned()),
        _ => None,
    };
    let string = |predicate| match object(predicate) {
        Some(Term::Literal(literal)) => Some(literal.value().to_owned()),
        _ => None,
    };
    let integer = |predicate| string(predicate).and_then(|value| value.parse::<u64>().ok());

    let mut shape = PropertyShapeDefinition::new(iri(sh::PATH)?);
    shape.name = string(sh::NAME);
    shape.description = string(sh::DESCRIPTION);
    shape.datatype = iri(sh::DATATYPE);
    shape.node_kind = match object(sh::NODE_KIND) {
        Some(Term::NamedNode(kind)) => NodeKind::from_iri(kind.as_ref()),
        _ => None,
    };
    shape.class = iri(sh::CLASS);
    shape.min_count = integer(sh::MIN_COUNT);
    shape.max_count = integer(sh::MAX_COUNT);
    shape.min_length = integer(sh::MIN_LENGTH);
    shape.max_length = integer(sh::MAX_LENGTH);
    shape.pattern = string(sh::PATTERN);
    shape.flags = string(sh::FLAGS);
    shape.min_inclusive = object(sh::MIN_INCLUSIVE).and_then(ShapeValue::from_term);
    shape.max_inclusive = object(sh::MAX_INCLUSIVE).and_then(ShapeValue::from_term);
    shape.min_exclusive = object(sh::MIN_EXCLUSIVE).and_then(ShapeValue::from_term);
    shape.max_exclusive = object(sh::MAX_EXCLUSIVE).and_then(ShapeValue::from_term);
    if let Some(list) = object(sh::IN) {
        shape.in_values = graph
            .read_list(list)
            .iter()
            .filter_map(ShapeValue::from_term)
            .collect();
    }
    shape.has_value = object(sh::HAS_VALUE).and_then(ShapeValue::from_term);
    shape.node = iri(sh::NODE);
    shape.message = string(sh::MESSAGE);
    shape.severity = match object(sh::SEVERITY) {
        Some(Term::NamedNode(severity)) => Severity::from_iri(severity.as_ref()),
        _ => None,
    };
    shape.order = string(sh::ORDER).and_then(|value| value.parse().ok());
    Some(shape)
}
