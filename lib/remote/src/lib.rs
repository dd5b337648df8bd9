//! Retrieval of [cube.link](https://cube.link/) cubes from SPARQL endpoints.
//!
//! [CubeQuery] builds the `CONSTRUCT` queries, [RemoteCubeFetcher] executes them against a
//! [ConstructEndpoint], usually an [HttpEndpoint].

mod endpoint;
mod fetcher;
mod queries;

pub use endpoint::{ConstructEndpoint, EndpointError, HttpEndpoint, DEFAULT_TIMEOUT};
pub use fetcher::{FetchMetadata, FetchedCube, RemoteCubeFetcher};
pub use queries::{CubeQuery, FetchOptions, QueryMode, UnknownQueryMode};
