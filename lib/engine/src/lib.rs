//! The analysis engine for [cube.link](https://cube.link/) cubes.
//!
//! The engine infers observation constraints ([constraint]), generates observations from
//! tabular rows ([generator]), renders SHACL shapes ([shapes]) and validates observations in
//! batches against a constraint ([validation]). All operations are synchronous and keep their
//! state local to a single call.

pub mod constraint;
pub mod extract;
pub mod generator;
pub mod registry;
pub mod roles;
pub mod shapes;
pub mod stats;
pub mod summary;
pub mod validation;

pub use constraint::{infer_constraint, observations, InferenceOptions, InferredConstraint};
pub use extract::{extract_constraint, ExtractedConstraint};
pub use registry::{OperationOutcome, OperationRegistry, OperationRequest};
