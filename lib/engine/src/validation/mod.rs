//! Batched validation of observations against a constraint.
//!
//! The conformance check itself is delegated to a [ConformanceChecker]. The [BatchValidator] only
//! partitions the observations and aggregates the reports.

mod report;

pub use report::{ValidationReport, ValidationResult};

use crate::constraint::discover_cube;
use crate::extract::extract_constraint;
use cubelink_model::io::to_turtle;
use cubelink_model::{CubeError, CubeGraph, ExternalError, NamedNode, Subject};

const OPERATION: &str = "validate-observations";

/// Checks a data graph against a shapes graph given as Turtle.
pub trait ConformanceChecker {
    fn validate(&self, data: &CubeGraph, shapes: &str) -> Result<ValidationReport, ExternalError>;
}

impl<F> ConformanceChecker for F
where
    F: Fn(&CubeGraph, &str) -> Result<ValidationReport, ExternalError>,
{
    fn validate(&self, data: &CubeGraph, shapes: &str) -> Result<ValidationReport, ExternalError> {
        self(data, shapes)
    }
}

/// Validates observations in batches of a fixed size.
///
/// A batch size of 0 validates all observations in a single batch.
pub struct BatchValidator<'a> {
    checker: &'a dyn ConformanceChecker,
    batch_size: usize,
}

impl<'a> BatchValidator<'a> {
    pub fn new(checker: &'a dyn ConformanceChecker, batch_size: usize) -> Self {
        Self {
            checker,
            batch_size,
        }
    }

    /// Validates `observations` of `graph` against `constraint`.
    ///
    /// If no constraint is given, the constraint of the cube in `graph` is used.
    ///
    /// # Errors
    ///
    /// Returns [CubeError::NoConstraintFound] if no constraint is given and none is found, and
    /// [CubeError::Conformance] if the checker fails.
    pub fn validate(
        &self,
        graph: &CubeGraph,
        observations: &[Subject],
        constraint: Option<&str>,
    ) -> Result<ValidationReport, CubeError> {
        let extracted;
        let constraint = match constraint {
            Some(constraint) => constraint,
            None => {
                extracted = constraint_text(graph)?;
                extracted.as_str()
            }
        };

        let batch_size = if self.batch_size == 0 {
            observations.len().max(1)
        } else {
            self.batch_size
        };

        let mut report = ValidationReport::conforming();
        let mut batches = 0;
        for (index, batch) in observations.chunks(batch_size).enumerate() {
            let data = graph.subgraph(batch);
            let batch_report = self
                .checker
                .validate(&data, constraint)
                .map_err(|source| CubeError::Conformance {
                    operation: OPERATION,
                    source,
                })?;
            tracing::debug!(
                batch = index + 1,
                observations = batch.len(),
                conforms = batch_report.conforms,
                violations = batch_report.violation_count,
                "Validated batch"
            );
            report.merge(batch_report);
            batches += 1;
        }

        report
            .metadata
            .insert("observationsValidated".to_owned(), observations.len());
        report.metadata.insert("batchSize".to_owned(), batch_size);
        report.metadata.insert("batches".to_owned(), batches);
        tracing::info!(
            observations = observations.len(),
            batches,
            conforms = report.conforms,
            violations = report.violation_count,
            warnings = report.warning_count,
            "Validated observations"
        );
        Ok(report)
    }
}

/// Serializes the constraint of the cube in `graph` to Turtle.
fn constraint_text(graph: &CubeGraph) -> Result<String, CubeError> {
    let cube: Option<NamedNode> = discover_cube(graph);
    let extracted = extract_constraint(graph, cube.as_ref().map(NamedNode::as_ref)).map_err(
        |error| match error {
            CubeError::NoConstraintFound { .. } => CubeError::NoConstraintFound {
                operation: OPERATION,
            },
            error => error,
        },
    )?;
    to_turtle(&extracted.graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{infer_constraint, observations, InferenceOptions};
    use crate::shapes::Severity;
    use cubelink_model::vocab::{cube, rdf};
    use cubelink_model::{Literal, Term};
    use std::cell::RefCell;
    use std::io;

    fn ex(local: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{local}"))
    }

    fn graph(count: usize) -> CubeGraph {
        let mut graph = CubeGraph::new();
        graph.add(ex("cube"), rdf::TYPE, cube::CUBE.into_owned());
        for index in 0..count {
            let observation = ex(&format!("obs/{index}"));
            graph.add(observation.clone(), rdf::TYPE, cube::OBSERVATION.into_owned());
            graph.add(observation, ex("value"), Literal::from(index as i64));
        }
        graph
    }

    /// Reports a violation for every observation with the value 13.
    struct Recording {
        batches: RefCell<Vec<usize>>,
    }

    impl ConformanceChecker for Recording {
        fn validate(
            &self,
            data: &CubeGraph,
            _shapes: &str,
        ) -> Result<ValidationReport, ExternalError> {
            let observations = observations(data);
            self.batches.borrow_mut().push(observations.len());
            let results = data
                .iter()
                .filter(|triple| triple.object == Term::from(Literal::from(13_i64)))
                .map(|triple| {
                    ValidationResult::new(Severity::Violation, "unlucky")
                        .with_focus_node(triple.subject.clone())
                })
                .collect();
            Ok(ValidationReport::from_results(results))
        }
    }

    fn recording() -> Recording {
        Recording {
            batches: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn splits_observations_into_batches() -> Result<(), CubeError> {
        let graph = graph(25);
        let checker = recording();
        let report =
            BatchValidator::new(&checker, 10).validate(&graph, &observations(&graph), Some(""))?;

        assert_eq!(*checker.batches.borrow(), vec![10, 10, 5]);
        assert!(!report.conforms);
        assert_eq!(report.violation_count, 1);
        assert_eq!(report.metadata["observationsValidated"], 25);
        assert_eq!(report.metadata["batchSize"], 10);
        assert_eq!(report.metadata["batches"], 3);
        Ok(())
    }

    #[test]
    fn batch_size_zero_is_a_single_batch() -> Result<(), CubeError> {
        let graph = graph(14);
        let checker = recording();
        let report =
            BatchValidator::new(&checker, 0).validate(&graph, &observations(&graph), Some(""))?;
        assert_eq!(*checker.batches.borrow(), vec![14]);
        assert!(!report.conforms);
        assert_eq!(report.violation_count, 1);
        assert_eq!(report.metadata["batches"], 1);
        Ok(())
    }

    #[test]
    fn counts_are_summed_across_batches() -> Result<(), CubeError> {
        let graph = graph(30);
        let always_failing = |data: &CubeGraph, _: &str| -> Result<ValidationReport, ExternalError> {
            let results = observations(data)
                .into_iter()
                .map(|observation| {
                    ValidationResult::new(Severity::Warning, "check").with_focus_node(observation)
                })
                .collect();
            Ok(ValidationReport::from_results(results))
        };
        let report = BatchValidator::new(&always_failing, 7).validate(
            &graph,
            &observations(&graph),
            Some(""),
        )?;
        assert!(report.conforms);
        assert_eq!(report.warning_count, 30);
        assert_eq!(report.results.len(), 30);
        assert_eq!(
            report.results[0].focus_node,
            Some(Term::from(ex("obs/0")))
        );
        Ok(())
    }

    #[test]
    fn no_observations_conform() -> Result<(), CubeError> {
        let graph = graph(0);
        let checker = recording();
        let report = BatchValidator::new(&checker, 10).validate(&graph, &[], Some(""))?;
        assert!(report.conforms);
        assert!(checker.batches.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn uses_constraint_of_the_cube() -> Result<(), CubeError> {
        let mut graph = graph(3);
        let inferred = infer_constraint(&graph, &ex("cube"), &InferenceOptions::default())?;
        graph.extend(inferred.graph.iter().cloned());

        let seen = RefCell::new(String::new());
        let checker = |_: &CubeGraph, shapes: &str| -> Result<ValidationReport, ExternalError> {
            seen.replace(shapes.to_owned());
            Ok(ValidationReport::conforming())
        };
        BatchValidator::new(&checker, 0).validate(&graph, &observations(&graph), None)?;
        assert!(seen.borrow().contains("http://example.com/cube/constraint"));
        assert!(seen.borrow().contains("http://example.com/value"));
        Ok(())
    }

    #[test]
    fn missing_constraint_is_an_error() {
        let graph = graph(3);
        let checker = recording();
        let result = BatchValidator::new(&checker, 0).validate(&graph, &observations(&graph), None);
        assert!(matches!(
            result,
            Err(CubeError::NoConstraintFound {
                operation: OPERATION
            })
        ));
    }

    #[test]
    fn checker_failures_are_surfaced() {
        let graph = graph(3);
        let failing = |_: &CubeGraph, _: &str| -> Result<ValidationReport, ExternalError> {
            Err(io::Error::other("engine crashed").into())
        };
        let result =
            BatchValidator::new(&failing, 0).validate(&graph, &observations(&graph), Some(""));
        assert!(matches!(result, Err(CubeError::Conformance { .. })));
    }
}
