use crate::shapes::Severity;
use cubelink_model::vocab::{rdf, sh};
use cubelink_model::{BlankNode, CubeGraph, Literal, NamedNode, Term};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single result reported by a conformance checker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub severity: Severity,
    pub message: String,
    #[serde(serialize_with = "display", skip_serializing_if = "Option::is_none")]
    pub focus_node: Option<Term>,
    #[serde(serialize_with = "display", skip_serializing_if = "Option::is_none")]
    pub path: Option<NamedNode>,
}

impl ValidationResult {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            focus_node: None,
            path: None,
        }
    }

    #[must_use]
    pub fn with_focus_node(mut self, focus_node: impl Into<Term>) -> Self {
        self.focus_node = Some(focus_node.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: NamedNode) -> Self {
        self.path = Some(path);
        self
    }
}

/// The outcome of a validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub conforms: bool,
    pub violation_count: usize,
    pub warning_count: usize,
    pub results: Vec<ValidationResult>,
    pub metadata: IndexMap<String, usize>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::conforming()
    }
}

impl ValidationReport {
    /// Creates an empty conforming report.
    pub fn conforming() -> Self {
        Self {
            conforms: true,
            violation_count: 0,
            warning_count: 0,
            results: Vec::new(),
            metadata: IndexMap::new(),
        }
    }

    /// Creates a report from results. The report conforms iff there is no violation.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let count = |severity| {
            results
                .iter()
                .filter(|result| result.severity == severity)
                .count()
        };
        let violation_count = count(Severity::Violation);
        let warning_count = count(Severity::Warning);
        Self {
            conforms: violation_count == 0,
            violation_count,
            warning_count,
            results,
            metadata: IndexMap::new(),
        }
    }

    /// Adds the outcome of `other` to this report.
    pub fn merge(&mut self, other: ValidationReport) {
        self.conforms &= other.conforms;
        self.violation_count += other.violation_count;
        self.warning_count += other.warning_count;
        self.results.extend(other.results);
    }

    /// Builds an `sh:ValidationReport` graph of this report.
    pub fn to_graph(&self) -> CubeGraph {
        let mut graph = CubeGraph::new();
        let report = BlankNode::default();
        graph.add(
            report.clone(),
            rdf::TYPE,
            sh::VALIDATION_REPORT.into_owned(),
        );
        graph.add(report.clone(), sh::CONFORMS, Literal::from(self.conforms));

        for result in &self.results {
            let node = BlankNode::default();
            graph.add(report.clone(), sh::RESULT, node.clone());
            graph.add(node.clone(), rdf::TYPE, sh::VALIDATION_RESULT.into_owned());
            if let Some(focus_node) = &result.focus_node {
                graph.add(node.clone(), sh::FOCUS_NODE, focus_node.clone());
            }
            if let Some(path) = &result.path {
                graph.add(node.clone(), sh::RESULT_PATH, path.clone());
            }
            graph.add(
                node.clone(),
                sh::RESULT_MESSAGE,
                Literal::new_simple_literal(&result.message),
            );
            graph.add(node, sh::RESULT_SEVERITY, result.severity.iri().into_owned());
        }
        graph
    }
}

fn display<T: fmt::Display, S: Serializer>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}
