use cubelink_model::io::{parse_graph, RdfFormat};
use cubelink_model::{CubeError, CubeGraph, ExternalError};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;

/// The timeout of a single request if none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const ACCEPTED_FORMATS: &str = "application/n-triples, text/turtle;q=0.9";

/// A SPARQL endpoint that answers `CONSTRUCT` queries.
pub trait ConstructEndpoint {
    /// The location of the endpoint, used in error messages.
    fn url(&self) -> &str;

    /// Executes `query` and returns the constructed graph.
    fn construct(&self, query: &str) -> Result<CubeGraph, ExternalError>;
}

/// An error raised by [HttpEndpoint].
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("the endpoint answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("the endpoint answered with the unsupported content type '{0}'")]
    UnsupportedContentType(String),
    #[error("the response is not a valid graph: {0}")]
    Parsing(#[from] CubeError),
}

/// A SPARQL 1.1 Protocol endpoint reached over HTTP.
///
/// Queries are sent as form-encoded POST requests. Requests that take longer than the timeout
/// fail instead of blocking.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    url: String,
    client: Client,
}

impl HttpEndpoint {
    pub fn new(url: impl Into<String>) -> Result<Self, EndpointError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, EndpointError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cubelink/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    fn execute(&self, query: &str) -> Result<CubeGraph, EndpointError> {
        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, ACCEPTED_FORMATS)
            .form(&[("query", query)])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(EndpointError::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        // Endpoints that omit the content type usually answer with N-Triples.
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/n-triples")
            .to_owned();
        let format = RdfFormat::from_media_type(&content_type)
            .ok_or(EndpointError::UnsupportedContentType(content_type))?;
        let body = response.bytes()?;
        Ok(parse_graph(format, body.as_ref())?)
    }
}

impl ConstructEndpoint for HttpEndpoint {
    fn url(&self) -> &str {
        &self.url
    }

    fn construct(&self, query: &str) -> Result<CubeGraph, ExternalError> {
        Ok(self.execute(query)?)
    }
}

