use oxiri::IriParseError;
use oxrdfio::RdfParseError;
use std::error::Error;
use std::io;

/// A boxed error raised by an external collaborator (row sources, conformance checkers, HTTP).
pub type ExternalError = Box<dyn Error + Send + Sync + 'static>;

/// An error raised by one of the cube operations.
///
/// Structural failures carry the name of the operation that failed (e.g. `infer-constraint`).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CubeError {
    /// The operation was invoked with an empty graph.
    #[error("{operation}: no input graph was given or the graph is empty")]
    NoInputGraph { operation: &'static str },
    /// The graph has no subject typed as `cube:Observation`.
    #[error("{operation}: no observations found in the input graph")]
    NoObservationsFound { operation: &'static str },
    /// No constraint was supplied and none could be discovered in the graph.
    #[error("{operation}: no observation constraint found")]
    NoConstraintFound { operation: &'static str },
    /// A value could not be parsed as a date with the configured pattern.
    #[error("The value '{value}' does not match the date pattern '{pattern}'")]
    MalformedDateValue { value: String, pattern: String },
    /// The SPARQL endpoint could not be reached, timed out, or answered with an error.
    #[error("{operation}: fetching cube <{cube}> from {endpoint} failed: {source}")]
    EndpointFailure {
        operation: &'static str,
        endpoint: String,
        cube: String,
        #[source]
        source: ExternalError,
    },
    /// A caller-supplied IRI or template is malformed.
    #[error("{operation}: invalid argument '{argument}': {message}")]
    InvalidPathArgument {
        operation: &'static str,
        argument: String,
        message: String,
    },
    /// The row source failed while producing rows.
    #[error("{operation}: reading rows failed: {source}")]
    RowSource {
        operation: &'static str,
        #[source]
        source: ExternalError,
    },
    /// The external conformance checker failed.
    #[error("{operation}: the conformance checker failed: {source}")]
    Conformance {
        operation: &'static str,
        #[source]
        source: ExternalError,
    },
    /// No operation is registered under the given identifier.
    #[error("unknown operation '{id}'")]
    UnknownOperation { id: String },
    /// An error raised while parsing RDF.
    #[error(transparent)]
    Parsing(#[from] RdfParseError),
    /// An error raised while writing RDF.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CubeError {
    /// Returns the name of the failed operation, if the error is tied to one.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            CubeError::NoInputGraph { operation }
            | CubeError::NoObservationsFound { operation }
            | CubeError::NoConstraintFound { operation }
            | CubeError::EndpointFailure { operation, .. }
            | CubeError::InvalidPathArgument { operation, .. }
            | CubeError::RowSource { operation, .. }
            | CubeError::Conformance { operation, .. } => Some(*operation),
            CubeError::MalformedDateValue { .. }
            | CubeError::UnknownOperation { .. }
            | CubeError::Parsing(_)
            | CubeError::Io(_) => None,
        }
    }

    /// Creates an [CubeError::InvalidPathArgument] from an IRI parsing error.
    pub fn invalid_iri(
        operation: &'static str,
        argument: impl Into<String>,
        error: &IriParseError,
    ) -> Self {
        CubeError::InvalidPathArgument {
            operation,
            argument: argument.into(),
            message: error.to_string(),
        }
    }
}

impl From<CubeError> for io::Error {
    #[inline]
    fn from(error: CubeError) -> Self {
        match error {
            CubeError::Io(error) => error,
            CubeError::Parsing(error) => error.into(),
            CubeError::InvalidPathArgument { .. } => {
                Self::new(io::ErrorKind::InvalidInput, error.to_string())
            }
            error => Self::other(error),
        }
    }
}
