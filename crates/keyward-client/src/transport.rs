//! The HTTP capability the client is layered on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::types::{RequestConfig, Response};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends one resolved request.
///
/// Any status the server answers with is an `Ok` response. Failures must be
/// reported as [`Error::NoResponse`] when the request may have been sent and
/// [`Error::Setup`] when it never left the client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestConfig, url: Url) -> Result<Response>;
}

/// Transport backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a new transport builder.
    pub fn builder() -> TransportBuilder {
        TransportBuilder::new()
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestConfig, url: Url) -> Result<Response> {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone())
            .timeout(self.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(classify)?;

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            data: decode_body(&bytes),
            config: request.clone(),
        })
    }
}

/// Builder errors never reached the network; everything else may have.
fn classify(error: reqwest::Error) -> Error {
    if error.is_builder() {
        Error::Setup(error.to_string())
    } else {
        Error::NoResponse(error.to_string())
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Builder for creating a [`ReqwestTransport`].
#[derive(Debug)]
pub struct TransportBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    headers: HeaderMap,
}

impl TransportBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            headers,
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Add a header sent with every request.
    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ReqwestTransport> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("keyward/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(self.headers)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(ReqwestTransport {
            http,
            timeout: self.timeout,
        })
    }
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
