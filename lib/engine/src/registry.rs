//! A static registry of the cube operations.
//!
//! Operations are registered explicitly by the host application. Usage example:
//!
//! ```
//! use cubelink_engine::registry::{OperationOutcome, OperationRegistry, OperationRequest};
//! use cubelink_model::vocab::{cube, rdf};
//! use cubelink_model::{CubeGraph, NamedNode};
//!
//! let mut graph = CubeGraph::new();
//! graph.add(
//!     NamedNode::new("http://example.com/cube")?,
//!     rdf::TYPE,
//!     cube::CUBE.into_owned(),
//! );
//!
//! let registry = OperationRegistry::standard(None);
//! let outcome = registry.execute("summarize-cube", &OperationRequest::new(graph))?;
//! assert!(matches!(outcome, OperationOutcome::Summary(_)));
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::constraint::{
    discover_cube, infer_constraint, observations, InferenceOptions, InferredConstraint,
};
use crate::extract::{extract_constraint, ExtractedConstraint};
use crate::summary::{summarize_cube, CubeSummary};
use crate::validation::{BatchValidator, ConformanceChecker, ValidationReport};
use cubelink_model::{CubeError, CubeGraph, NamedNode};
use indexmap::IndexMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A reference-counted pointer to a [CubeOperation].
pub type CubeOperationRef = Arc<dyn CubeOperation>;

/// A reference-counted pointer to a [ConformanceChecker] that can be shared between threads.
pub type ConformanceCheckerRef = Arc<dyn ConformanceChecker + Send + Sync>;

/// The input of a [CubeOperation].
#[derive(Clone, Debug, Default)]
pub struct OperationRequest {
    pub graph: CubeGraph,
    /// The cube to operate on. If absent, the first `cube:Cube` of the graph is used.
    pub cube: Option<NamedNode>,
    pub inference: InferenceOptions,
    /// A constraint as Turtle. If absent, the constraint of the cube is used.
    pub constraint: Option<String>,
    pub batch_size: usize,
}

impl OperationRequest {
    pub fn new(graph: CubeGraph) -> Self {
        Self {
            graph,
            ..Self::default()
        }
    }

    fn cube(&self) -> Option<NamedNode> {
        self.cube.clone().or_else(|| discover_cube(&self.graph))
    }
}

/// The output of a [CubeOperation].
#[derive(Clone, Debug)]
pub enum OperationOutcome {
    Constraint(InferredConstraint),
    ExtractedConstraint(ExtractedConstraint),
    Summary(CubeSummary),
    Report(ValidationReport),
}

impl OperationOutcome {
    /// The graph produced by the operation, if any.
    pub fn graph(&self) -> Option<&CubeGraph> {
        match self {
            OperationOutcome::Constraint(inferred) => Some(&inferred.graph),
            OperationOutcome::ExtractedConstraint(extracted) => Some(&extracted.graph),
            OperationOutcome::Summary(_) | OperationOutcome::Report(_) => None,
        }
    }
}

/// An operation that can be looked up by its identifier.
pub trait CubeOperation: Debug + Send + Sync {
    /// The identifier, e.g. `infer-constraint`.
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn execute(&self, request: &OperationRequest) -> Result<OperationOutcome, CubeError>;
}

/// Infers the constraint of the observations of a cube.
#[derive(Debug, Default)]
pub struct InferConstraintOperation;

impl CubeOperation for InferConstraintOperation {
    fn id(&self) -> &'static str {
        "infer-constraint"
    }

    fn description(&self) -> &'static str {
        "Infers a SHACL constraint from the observations of a cube"
    }

    fn execute(&self, request: &OperationRequest) -> Result<OperationOutcome, CubeError> {
        if request.graph.is_empty() {
            return Err(CubeError::NoInputGraph {
                operation: self.id(),
            });
        }
        let cube = request
            .cube()
            .ok_or_else(|| CubeError::InvalidPathArgument {
                operation: self.id(),
                argument: "cube".to_owned(),
                message: "no cube IRI was given and the graph contains no cube:Cube".to_owned(),
            })?;
        infer_constraint(&request.graph, &cube, &request.inference)
            .map(OperationOutcome::Constraint)
    }
}

/// Copies the constraint of a cube out of the graph.
#[derive(Debug, Default)]
pub struct ExtractConstraintOperation;

impl CubeOperation for ExtractConstraintOperation {
    fn id(&self) -> &'static str {
        "extract-constraint"
    }

    fn description(&self) -> &'static str {
        "Extracts the observation constraint of a cube"
    }

    fn execute(&self, request: &OperationRequest) -> Result<OperationOutcome, CubeError> {
        let cube = request.cube();
        extract_constraint(&request.graph, cube.as_ref().map(NamedNode::as_ref))
            .map(OperationOutcome::ExtractedConstraint)
    }
}

/// Summarizes the observations and the constraint of a cube.
#[derive(Debug, Default)]
pub struct SummarizeCubeOperation;

impl CubeOperation for SummarizeCubeOperation {
    fn id(&self) -> &'static str {
        "summarize-cube"
    }

    fn description(&self) -> &'static str {
        "Summarizes the observations, properties and constraint of a cube"
    }

    fn execute(&self, request: &OperationRequest) -> Result<OperationOutcome, CubeError> {
        summarize_cube(&request.graph, request.cube.as_ref()).map(OperationOutcome::Summary)
    }
}

/// Validates the observations of a cube in batches.
pub struct ValidateObservationsOperation {
    checker: ConformanceCheckerRef,
}

impl ValidateObservationsOperation {
    pub fn new(checker: ConformanceCheckerRef) -> Self {
        Self { checker }
    }
}

impl Debug for ValidateObservationsOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidateObservationsOperation").finish_non_exhaustive()
    }
}

impl CubeOperation for ValidateObservationsOperation {
    fn id(&self) -> &'static str {
        "validate-observations"
    }

    fn description(&self) -> &'static str {
        "Validates the observations of a cube against its constraint"
    }

    fn execute(&self, request: &OperationRequest) -> Result<OperationOutcome, CubeError> {
        let observations = observations(&request.graph);
        BatchValidator::new(self.checker.as_ref(), request.batch_size)
            .validate(
                &request.graph,
                &observations,
                request.constraint.as_deref(),
            )
            .map(OperationOutcome::Report)
    }
}

/// Maps operation identifiers to operations.
#[derive(Debug, Default, Clone)]
pub struct OperationRegistry {
    operations: IndexMap<&'static str, CubeOperationRef>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in operations.
    ///
    /// `validate-observations` is only registered if a conformance checker is given.
    pub fn standard(checker: Option<ConformanceCheckerRef>) -> Self {
        let registry = Self::new()
            .with(InferConstraintOperation)
            .with(ExtractConstraintOperation)
            .with(SummarizeCubeOperation);
        match checker {
            Some(checker) => registry.with(ValidateObservationsOperation::new(checker)),
            None => registry,
        }
    }

    /// Registers `operation`, replacing an operation with the same identifier.
    #[must_use]
    pub fn with(mut self, operation: impl CubeOperation + 'static) -> Self {
        self.register(Arc::new(operation));
        self
    }

    pub fn register(&mut self, operation: CubeOperationRef) {
        self.operations.insert(operation.id(), operation);
    }

    pub fn get(&self, id: &str) -> Option<&CubeOperationRef> {
        self.operations.get(id)
    }

    /// The registered operations in registration order.
    pub fn operations(&self) -> impl Iterator<Item = &CubeOperationRef> {
        self.operations.values()
    }

    /// Executes the operation registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [CubeError::UnknownOperation] if there is no such operation.
    pub fn execute(
        &self,
        id: &str,
        request: &OperationRequest,
    ) -> Result<OperationOutcome, CubeError> {
        let operation = self.get(id).ok_or_else(|| CubeError::UnknownOperation {
            id: id.to_owned(),
        })?;
        tracing::debug!(operation = id, "Executing operation");
        operation.execute(request)
    }
}
