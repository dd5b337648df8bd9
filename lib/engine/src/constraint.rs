//! Inference of an observation constraint from the observations of a cube.
//!
//! The inference runs a single pass over the observations ([collect_property_stats]) and turns the
//! statistics of each property into a property shape. Usage example:
//!
//! ```
//! use cubelink_engine::constraint::{infer_constraint, InferenceOptions};
//! use cubelink_model::vocab::{cube, rdf, xsd};
//! use cubelink_model::{CubeGraph, Literal, NamedNode};
//!
//! let cube_iri = NamedNode::new("http://example.com/cube")?;
//! let observation = NamedNode::new("http://example.com/obs/1")?;
//! let mut graph = CubeGraph::new();
//! graph.add(observation.clone(), rdf::TYPE, cube::OBSERVATION.into_owned());
//! graph.add(
//!     observation,
//!     NamedNode::new("http://example.com/year")?,
//!     Literal::new_typed_literal("2024", xsd::G_YEAR),
//! );
//!
//! let inferred = infer_constraint(&graph, &cube_iri, &InferenceOptions::default())?;
//! assert_eq!(inferred.constraint.as_str(), "http://example.com/cube/constraint");
//! assert_eq!(inferred.shapes[0].datatype.as_deref(), Some(xsd::G_YEAR.as_str()));
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::roles::{infer_role, DimensionRole};
use crate::shapes::{
    shape_triples, NodeKind, PropertyShapeDefinition, ShapeDefinition, ShapeTarget, ShapeValue,
};
use crate::stats::{collect_property_stats, PropertyStats, PropertyStatsMap};
use cubelink_model::vocab::{cube, rdf};
use cubelink_model::{local_name, CubeError, CubeGraph, NamedNode, Subject};

const OPERATION: &str = "infer-constraint";

/// Properties with more distinct values than this are never enumerated.
pub const ENUMERABLE_LIMIT: usize = 100;

/// The default maximum number of values in an `sh:in` list.
pub const DEFAULT_MAX_ENUM_VALUES: usize = 50;

/// Options of the constraint inference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferenceOptions {
    /// The IRI of the constraint. Defaults to the cube IRI followed by `/constraint`.
    pub constraint: Option<NamedNode>,
    /// Assert `cube:KeyDimension` or `cube:MeasureDimension` on each property.
    pub infer_dimension_roles: bool,
    /// Emit `sh:in` lists for properties with few distinct values.
    pub include_value_enumeration: bool,
    pub max_enum_values: usize,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            constraint: None,
            infer_dimension_roles: true,
            include_value_enumeration: true,
            max_enum_values: DEFAULT_MAX_ENUM_VALUES,
        }
    }
}

/// The result of a constraint inference.
#[derive(Clone, Debug, PartialEq)]
pub struct InferredConstraint {
    pub constraint: NamedNode,
    /// The constraint, its property shapes, the role assertions and the link from the cube.
    pub graph: CubeGraph,
    /// The property shapes in the order the properties were first seen.
    pub shapes: Vec<PropertyShapeDefinition>,
    /// The inferred roles. Empty if role inference is disabled.
    pub roles: Vec<(NamedNode, DimensionRole)>,
}

/// Returns all subjects typed as `cube:Observation` in the order they were first seen.
pub fn observations(graph: &CubeGraph) -> Vec<Subject> {
    graph.subjects_with_type(cube::OBSERVATION)
}

/// Returns the first IRI typed as `cube:Cube`.
pub fn discover_cube(graph: &CubeGraph) -> Option<NamedNode> {
    graph
        .subjects_with_type(cube::CUBE)
        .into_iter()
        .find_map(|subject| match subject {
            Subject::NamedNode(node) => Some(node),
            _ => None,
        })
}

/// Infers the constraint of the observations of `cube` contained in `graph`.
///
/// # Errors
///
/// Returns [CubeError::NoInputGraph] for an empty graph and [CubeError::NoObservationsFound] if
/// the graph contains no observations.
pub fn infer_constraint(
    graph: &CubeGraph,
    cube: &NamedNode,
    options: &InferenceOptions,
) -> Result<InferredConstraint, CubeError> {
    if graph.is_empty() {
        return Err(CubeError::NoInputGraph {
            operation: OPERATION,
        });
    }
    let observations = observations(graph);
    if observations.is_empty() {
        return Err(CubeError::NoObservationsFound {
            operation: OPERATION,
        });
    }

    let stats = collect_property_stats(graph, &observations);
    let inferred = ConstraintBuilder::new(options).build(cube, &stats)?;
    tracing::info!(
        cube = cube.as_str(),
        constraint = inferred.constraint.as_str(),
        observations = observations.len(),
        properties = inferred.shapes.len(),
        "Inferred constraint"
    );
    Ok(inferred)
}

/// Turns property statistics into a constraint.
#[derive(Debug)]
pub struct ConstraintBuilder<'a> {
    options: &'a InferenceOptions,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(options: &'a InferenceOptions) -> Self {
        Self { options }
    }

    /// Builds the constraint of `cube` from the statistics of its properties.
    pub fn build(
        &self,
        cube: &NamedNode,
        stats: &PropertyStatsMap,
    ) -> Result<InferredConstraint, CubeError> {
        let constraint = match &self.options.constraint {
            Some(constraint) => constraint.clone(),
            None => {
                let iri = format!("{}/constraint", cube.as_str());
                NamedNode::new(&iri)
                    .map_err(|error| CubeError::invalid_iri(OPERATION, iri, &error))?
            }
        };

        let shapes = stats
            .iter()
            .zip(1_i64..)
            .map(|((property, stats), order)| self.property_shape(property, stats, order))
            .collect::<Vec<_>>();
        let roles = if self.options.infer_dimension_roles {
            stats
                .iter()
                .map(|(property, stats)| (property.clone(), infer_role(stats)))
                .collect()
        } else {
            Vec::new()
        };

        let definition = ShapeDefinition {
            iri: constraint.as_str().to_owned(),
            types: vec![cube::CONSTRAINT.as_str().to_owned()],
            target: Some(ShapeTarget::Class(cube::OBSERVATION.as_str().to_owned())),
            closed: Some(false),
            ignored_properties: Vec::new(),
            properties: shapes,
        };
        let mut graph = shape_triples(&definition)?;
        for (property, role) in &roles {
            graph.add(property.clone(), rdf::TYPE, role.class().into_owned());
        }
        graph.add(
            cube.clone(),
            cube::OBSERVATION_CONSTRAINT,
            constraint.clone(),
        );
        tracing::debug!(
            constraint = constraint.as_str(),
            triples = graph.len(),
            "Built constraint graph"
        );

        Ok(InferredConstraint {
            constraint,
            graph,
            shapes: definition.properties,
            roles,
        })
    }

    /// Builds the property shape of a single property.
    pub fn property_shape(
        &self,
        property: &NamedNode,
        stats: &PropertyStats,
        order: i64,
    ) -> PropertyShapeDefinition {
        let mut shape = PropertyShapeDefinition::new(property.as_str());
        shape.name = Some(humanize(local_name(property.as_str())));
        shape.min_count = Some(1);
        shape.max_count = Some(1);
        if let Some(datatype) = stats.consistent_datatype() {
            shape.datatype = Some(datatype.as_str().to_owned());
        }
        if stats.all_values_are_iris() {
            shape.node_kind = Some(NodeKind::Iri);
        }
        if self.options.include_value_enumeration
            && stats.is_enumerable(ENUMERABLE_LIMIT)
            && stats.distinct_value_count() <= self.options.max_enum_values
        {
            shape.in_values = enumeration(stats);
        }
        shape.order = Some(order);
        shape
    }
}

/// Builds the `sh:in` values of a property. Each member keeps the kind and datatype of the value it
/// was seen as.
///
/// Blank nodes cannot be enumerated, so properties with blank node values are not enumerated.
fn enumeration(stats: &PropertyStats) -> Vec<ShapeValue> {
    if stats.has_blank_values() {
        return Vec::new();
    }
    stats.values().filter_map(ShapeValue::from_term).collect()
}

/// Splits a camelCase, snake_case or kebab-case name into lowercase words.
///
/// ```
/// use cubelink_engine::constraint::humanize;
///
/// assert_eq!(humanize("populationTotal"), "population total");
/// assert_eq!(humanize("reference_year"), "reference year");
/// ```
pub fn humanize(name: &str) -> String {
    let mut words = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;
    for c in name.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            previous = None;
            continue;
        }
        let boundary = match previous {
            None => !words.is_empty(),
            Some(previous) => {
                c.is_uppercase() && (previous.is_lowercase() || previous.is_ascii_digit())
            }
        };
        if boundary {
            words.push(' ');
        }
        words.extend(c.to_lowercase());
        previous = Some(c);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_constraint, read_property_shapes};
    use cubelink_model::vocab::{sh, xsd};
    use cubelink_model::{Literal, Term};

    fn ex(local: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{local}"))
    }

    /// Two hundred observations with a key IRI, a year with 4 distinct values, many numeric values
    /// and a string label with 60 distinct values.
    fn cube_graph() -> CubeGraph {
        let mut graph = CubeGraph::new();
        for index in 0..200 {
            let observation = ex(&format!("obs/{index}"));
            graph.add(observation.clone(), rdf::TYPE, cube::OBSERVATION.into_owned());
            graph.add(observation.clone(), cube::OBSERVED_BY, ex("cube"));
            graph.add(
                observation.clone(),
                ex("year"),
                Literal::new_typed_literal((2020 + index % 4).to_string(), xsd::G_YEAR),
            );
            graph.add(
                observation.clone(),
                ex("populationTotal"),
                Literal::new_typed_literal((1000 + index).to_string(), xsd::INTEGER),
            );
            graph.add(
                observation,
                ex("label"),
                Literal::new_simple_literal(format!("label {}", index % 60)),
            );
        }
        graph
    }

    fn shape<'a>(inferred: &'a InferredConstraint, local: &str) -> &'a PropertyShapeDefinition {
        inferred
            .shapes
            .iter()
            .find(|shape| local_name(&shape.path) == local)
            .unwrap_or_else(|| panic!("no shape for {local}"))
    }

    #[test]
    fn consistent_literals_get_a_datatype() -> Result<(), CubeError> {
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &InferenceOptions::default())?;
        let year = shape(&inferred, "year");
        assert_eq!(year.datatype.as_deref(), Some(xsd::G_YEAR.as_str()));
        assert_eq!(year.node_kind, None);
        assert_eq!(year.min_count, Some(1));
        assert_eq!(year.max_count, Some(1));
        assert_eq!(year.name.as_deref(), Some("year"));
        assert_eq!(
            year.in_values,
            (2020..2024)
                .map(|year| ShapeValue::typed(year.to_string(), xsd::G_YEAR.as_str()))
                .collect::<Vec<_>>()
        );
        Ok(())
    }

    #[test]
    fn iri_values_get_a_node_kind() -> Result<(), CubeError> {
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &InferenceOptions::default())?;
        let observed_by = shape(&inferred, "observedBy");
        assert_eq!(observed_by.node_kind, Some(NodeKind::Iri));
        assert_eq!(observed_by.datatype, None);
        assert_eq!(
            observed_by.in_values,
            vec![ShapeValue::Iri(ex("cube").as_str().to_owned())]
        );
        Ok(())
    }

    #[test]
    fn large_value_sets_are_not_enumerated() -> Result<(), CubeError> {
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &InferenceOptions::default())?;
        assert!(shape(&inferred, "label").in_values.is_empty());
        assert!(shape(&inferred, "populationTotal").in_values.is_empty());

        let options = InferenceOptions {
            max_enum_values: 60,
            ..InferenceOptions::default()
        };
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &options)?;
        assert_eq!(shape(&inferred, "label").in_values.len(), 60);

        let options = InferenceOptions {
            max_enum_values: 500,
            ..InferenceOptions::default()
        };
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &options)?;
        assert!(shape(&inferred, "populationTotal").in_values.is_empty());
        Ok(())
    }

    #[test]
    fn enumeration_can_be_disabled() -> Result<(), CubeError> {
        let options = InferenceOptions {
            include_value_enumeration: false,
            ..InferenceOptions::default()
        };
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &options)?;
        assert!(inferred.shapes.iter().all(|shape| shape.in_values.is_empty()));
        Ok(())
    }

    #[test]
    fn mixed_values_are_enumerated_as_seen() -> Result<(), CubeError> {
        let values: Vec<Term> = vec![
            Literal::new_typed_literal("1", xsd::INTEGER).into(),
            Literal::new_typed_literal("1", xsd::DECIMAL).into(),
            Literal::new_typed_literal("2.5", xsd::DECIMAL).into(),
            ex("x").into(),
            Literal::new_language_tagged_literal_unchecked("Bern", "de").into(),
        ];
        let mut graph = CubeGraph::new();
        for (index, value) in values.iter().enumerate() {
            let observation = ex(&format!("obs/{index}"));
            graph.add(observation.clone(), rdf::TYPE, cube::OBSERVATION.into_owned());
            graph.add(observation, ex("value"), value.clone());
        }

        let inferred = infer_constraint(&graph, &ex("cube"), &InferenceOptions::default())?;
        let shape = shape(&inferred, "value");
        assert_eq!(shape.datatype, None);
        assert_eq!(shape.node_kind, None);
        assert_eq!(shape.in_values.len(), values.len());

        let list = inferred
            .graph
            .iter()
            .find(|triple| triple.predicate.as_ref() == sh::IN)
            .map(|triple| triple.object.clone())
            .unwrap_or_else(|| panic!("no sh:in list"));
        assert_eq!(inferred.graph.read_list(&list), values);
        Ok(())
    }

    #[test]
    fn infers_roles() -> Result<(), CubeError> {
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &InferenceOptions::default())?;
        assert!(inferred
            .roles
            .contains(&(ex("populationTotal"), DimensionRole::MeasureDimension)));
        assert!(inferred
            .roles
            .contains(&(ex("year"), DimensionRole::KeyDimension)));
        assert!(inferred.graph.has_type(
            &ex("populationTotal").into(),
            cube::MEASURE_DIMENSION
        ));

        let options = InferenceOptions {
            infer_dimension_roles: false,
            ..InferenceOptions::default()
        };
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &options)?;
        assert!(inferred.roles.is_empty());
        assert!(!inferred.graph.has_type(&ex("year").into(), cube::KEY_DIMENSION));
        Ok(())
    }

    #[test]
    fn orders_follow_first_seen_properties() -> Result<(), CubeError> {
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &InferenceOptions::default())?;
        let paths = inferred
            .shapes
            .iter()
            .map(|shape| (shape.order, local_name(&shape.path).to_owned()))
            .collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                (Some(1), "observedBy".to_owned()),
                (Some(2), "year".to_owned()),
                (Some(3), "populationTotal".to_owned()),
                (Some(4), "label".to_owned()),
            ]
        );
        Ok(())
    }

    #[test]
    fn constraint_graph_is_linked_and_open() -> Result<(), CubeError> {
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &InferenceOptions::default())?;
        let constraint = Subject::from(inferred.constraint.clone());
        assert!(inferred.graph.has_type(&constraint, cube::CONSTRAINT));
        assert!(inferred.graph.has_type(&constraint, sh::NODE_SHAPE));
        assert_eq!(
            inferred
                .graph
                .object_for_subject_predicate(&constraint, sh::TARGET_CLASS),
            Some(&Term::from(cube::OBSERVATION.into_owned()))
        );
        assert_eq!(
            inferred
                .graph
                .object_for_subject_predicate(&constraint, sh::CLOSED),
            Some(&Term::from(Literal::from(false)))
        );
        assert_eq!(
            inferred
                .graph
                .object_for_subject_predicate(&ex("cube").into(), cube::OBSERVATION_CONSTRAINT),
            Some(&Term::from(inferred.constraint.clone()))
        );
        Ok(())
    }

    #[test]
    fn inference_is_idempotent() -> Result<(), CubeError> {
        let graph = cube_graph();
        let first = infer_constraint(&graph, &ex("cube"), &InferenceOptions::default())?;
        let second = infer_constraint(&graph, &ex("cube"), &InferenceOptions::default())?;
        assert_eq!(first.shapes, second.shapes);
        assert_eq!(first.roles, second.roles);

        let extracted = |inferred: &InferredConstraint| -> Result<_, CubeError> {
            let constraint = extract_constraint(&inferred.graph, Some(ex("cube").as_ref()))?;
            Ok(read_property_shapes(&constraint.graph, &constraint.constraint))
        };
        assert_eq!(extracted(&first)?, extracted(&second)?);
        assert_eq!(extracted(&first)?, first.shapes);
        Ok(())
    }

    #[test]
    fn empty_graph_is_an_error() {
        assert!(matches!(
            infer_constraint(&CubeGraph::new(), &ex("cube"), &InferenceOptions::default()),
            Err(CubeError::NoInputGraph {
                operation: "infer-constraint"
            })
        ));
    }

    #[test]
    fn graph_without_observations_is_an_error() {
        let mut graph = CubeGraph::new();
        graph.add(ex("cube"), rdf::TYPE, cube::CUBE.into_owned());
        assert!(matches!(
            infer_constraint(&graph, &ex("cube"), &InferenceOptions::default()),
            Err(CubeError::NoObservationsFound { .. })
        ));
    }

    #[test]
    fn custom_constraint_iri() -> Result<(), CubeError> {
        let options = InferenceOptions {
            constraint: Some(ex("shape")),
            ..InferenceOptions::default()
        };
        let inferred = infer_constraint(&cube_graph(), &ex("cube"), &options)?;
        assert_eq!(inferred.constraint, ex("shape"));
        Ok(())
    }

    #[test]
    fn discovers_cube() {
        let mut graph = cube_graph();
        assert_eq!(discover_cube(&graph), None);
        graph.add(ex("cube"), rdf::TYPE, cube::CUBE.into_owned());
        assert_eq!(discover_cube(&graph), Some(ex("cube")));
    }

    #[test]
    fn humanizes_names() {
        assert_eq!(humanize("populationTotal"), "population total");
        assert_eq!(humanize("snake_case_name"), "snake case name");
        assert_eq!(humanize("kebab-case"), "kebab case");
        assert_eq!(humanize("year2020Value"), "year2020 value");
        assert_eq!(humanize("City"), "city");
    }
}
