use crate::constraint::{discover_cube, observations};
use crate::extract::extract_constraint;
use crate::roles::{infer_role, DimensionRole};
use crate::stats::collect_property_stats;
use cubelink_model::{CubeError, CubeGraph, NamedNode};
use serde::Serialize;

const OPERATION: &str = "summarize-cube";

/// An overview of the properties of a single observation property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    pub property: String,
    pub count: usize,
    pub distinct_values: usize,
    /// Set if there were more distinct values than could be counted.
    pub values_overflowed: bool,
    pub datatypes: Vec<String>,
    pub role: DimensionRole,
}

/// An overview of a cube graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeSummary {
    pub cube: Option<String>,
    pub triples: usize,
    pub observations: usize,
    pub properties: Vec<PropertySummary>,
    pub constraint: Option<String>,
    /// The number of property shapes of the constraint.
    pub constraint_properties: usize,
}

/// Summarizes the observations and the constraint of a cube.
///
/// Graphs without observations (e.g. fetched metadata) are summarized as well.
pub fn summarize_cube(
    graph: &CubeGraph,
    cube: Option<&NamedNode>,
) -> Result<CubeSummary, CubeError> {
    if graph.is_empty() {
        return Err(CubeError::NoInputGraph {
            operation: OPERATION,
        });
    }
    let cube = cube.cloned().or_else(|| discover_cube(graph));
    let observations = observations(graph);
    let properties = collect_property_stats(graph, &observations)
        .iter()
        .map(|(property, stats)| PropertySummary {
            property: property.as_str().to_owned(),
            count: stats.count(),
            distinct_values: stats.distinct_value_count(),
            values_overflowed: stats.values_overflowed(),
            datatypes: stats
                .datatypes()
                .map(|datatype| datatype.as_str().to_owned())
                .collect(),
            role: infer_role(stats),
        })
        .collect();
    let constraint = extract_constraint(graph, cube.as_ref().map(NamedNode::as_ref)).ok();

    Ok(CubeSummary {
        cube: cube.map(NamedNode::into_string),
        triples: graph.len(),
        observations: observations.len(),
        properties,
        constraint_properties: constraint
            .as_ref()
            .map_or(0, |constraint| constraint.shapes().len()),
        constraint: constraint.map(|constraint| constraint.constraint.to_string()),
    })
}
