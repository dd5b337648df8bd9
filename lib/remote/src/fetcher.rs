use crate::endpoint::ConstructEndpoint;
use crate::queries::{CubeQuery, FetchOptions, QueryMode};
use cubelink_model::{CubeError, CubeGraph, NamedNode};
use serde::Serialize;

/// Information about a fetch that is returned next to the graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchMetadata {
    pub triple_count: usize,
    pub cube: String,
    pub endpoint: String,
    pub mode: QueryMode,
    /// Only set for [QueryMode::ObservationsOnly].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Only set for [QueryMode::ObservationsOnly].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// A graph retrieved from an endpoint.
#[derive(Clone, Debug)]
pub struct FetchedCube {
    pub graph: CubeGraph,
    pub metadata: FetchMetadata,
}

/// Retrieves cubes, or parts of them, from a [ConstructEndpoint].
#[derive(Debug, Clone)]
pub struct RemoteCubeFetcher<E> {
    endpoint: E,
}

impl<E: ConstructEndpoint> RemoteCubeFetcher<E> {
    pub fn new(endpoint: E) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Executes the query of `mode` for `cube`.
    ///
    /// # Errors
    ///
    /// Every failure of the endpoint (unreachable, timeout, error status, malformed response) is
    /// returned as [CubeError::EndpointFailure].
    pub fn fetch(
        &self,
        mode: QueryMode,
        cube: &NamedNode,
        options: &FetchOptions,
    ) -> Result<FetchedCube, CubeError> {
        let query = CubeQuery::build(mode, cube, options);
        tracing::debug!(
            endpoint = self.endpoint.url(),
            cube = cube.as_str(),
            mode = mode.as_str(),
            "Fetching cube"
        );
        let graph =
            self.endpoint
                .construct(query.as_str())
                .map_err(|source| CubeError::EndpointFailure {
                    operation: mode.operation(),
                    endpoint: self.endpoint.url().to_owned(),
                    cube: cube.as_str().to_owned(),
                    source,
                })?;

        let (limit, offset) = if mode.is_paginated() {
            (Some(options.limit), Some(options.offset))
        } else {
            (None, None)
        };
        let metadata = FetchMetadata {
            triple_count: graph.len(),
            cube: cube.as_str().to_owned(),
            endpoint: self.endpoint.url().to_owned(),
            mode,
            limit,
            offset,
        };
        tracing::info!(
            endpoint = self.endpoint.url(),
            cube = cube.as_str(),
            mode = mode.as_str(),
            triples = metadata.triple_count,
            "Fetched cube"
        );
        Ok(FetchedCube { graph, metadata })
    }

    pub fn fetch_cube(
        &self,
        cube: &NamedNode,
        named_graph: Option<&NamedNode>,
    ) -> Result<FetchedCube, CubeError> {
        self.fetch(QueryMode::FullCube, cube, &graph_options(named_graph))
    }

    pub fn fetch_metadata(
        &self,
        cube: &NamedNode,
        named_graph: Option<&NamedNode>,
    ) -> Result<FetchedCube, CubeError> {
        self.fetch(QueryMode::MetadataOnly, cube, &graph_options(named_graph))
    }

    pub fn fetch_constraint(
        &self,
        cube: &NamedNode,
        named_graph: Option<&NamedNode>,
    ) -> Result<FetchedCube, CubeError> {
        self.fetch(QueryMode::ConstraintOnly, cube, &graph_options(named_graph))
    }

    pub fn fetch_observations(
        &self,
        cube: &NamedNode,
        options: &FetchOptions,
    ) -> Result<FetchedCube, CubeError> {
        self.fetch(QueryMode::ObservationsOnly, cube, options)
    }
}

fn graph_options(named_graph: Option<&NamedNode>) -> FetchOptions {
    FetchOptions {
        named_graph: named_graph.cloned(),
        ..FetchOptions::default()
    }
}
