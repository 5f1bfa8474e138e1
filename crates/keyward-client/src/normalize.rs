//! Error normalization.
//!
//! Every failed request is classified as one of: the server answered with a
//! non-success status, no response came back, the request never left the
//! client, or the session could not be established. Each class is rendered
//! into the same [`NormalizedError`] shape.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::client::AuthenticatedClient;
use crate::error::{Error, Result};
use crate::interceptor::ResponseInterceptor;
use crate::types::{RequestConfig, Response};

/// Status reported when no response was received.
pub const NO_RESPONSE_STATUS: u16 = 502;

/// Status reported when the request never left the client.
pub const SETUP_STATUS: u16 = 500;

/// Status reported for authentication failures with no upstream answer.
pub const AUTH_STATUS: u16 = 401;

/// Failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ServerResponded,
    NoResponse,
    Setup,
    /// Login, refresh or a token invariant failed before the request was sent.
    Auth,
}

/// A failure in the shape surfaced to callers.
///
/// `data` is the upstream body (an object, or `{"body": ...}` for anything
/// else) with `error`, `messageError`, `status` and `statusText` merged in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedError {
    pub kind: FailureKind,
    pub error: bool,
    pub message_error: String,
    pub status: u16,
    pub status_text: String,
    pub url: Option<String>,
    pub data: Value,
}

impl NormalizedError {
    fn build(
        kind: FailureKind,
        status: u16,
        status_text: &str,
        message: String,
        url: Option<String>,
        body: Value,
    ) -> Self {
        let mut data = match body {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("body".to_string(), other);
                map
            }
        };
        data.insert("error".to_string(), Value::Bool(true));
        data.insert("messageError".to_string(), json!(message));
        data.insert("status".to_string(), json!(status));
        data.insert("statusText".to_string(), json!(status_text));

        Self {
            kind,
            error: true,
            message_error: message,
            status,
            status_text: status_text.to_string(),
            url,
            data: Value::Object(data),
        }
    }

    /// The server answered with a non-success status.
    pub fn server_responded(response: &Response, message: String) -> Self {
        Self::build(
            FailureKind::ServerResponded,
            response.status,
            &response.status_text,
            message,
            Some(response.config.url.clone()),
            response.data.clone(),
        )
    }

    /// No response was received.
    pub fn no_response(message: String) -> Self {
        Self::build(
            FailureKind::NoResponse,
            NO_RESPONSE_STATUS,
            "Bad Gateway",
            message,
            None,
            Value::Null,
        )
    }

    /// The request never left the client.
    pub fn setup(message: String) -> Self {
        Self::build(
            FailureKind::Setup,
            SETUP_STATUS,
            "Internal Server Error",
            message,
            None,
            Value::Null,
        )
    }

    /// The session could not be established.
    ///
    /// An exchange that failed on the wire keeps the status, url and body of
    /// that failure. Anything else reports 401.
    pub fn auth(error: &Error) -> Self {
        let underlying = match error {
            Error::LoginFailed {
                source: Some(source),
                ..
            }
            | Error::RefreshFailed {
                source: Some(source),
                ..
            } => Some(source.normalized()),
            _ => None,
        };

        match underlying {
            Some(inner) => Self::build(
                FailureKind::Auth,
                inner.status,
                &inner.status_text,
                error.to_string(),
                inner.url,
                inner.data,
            ),
            None => Self::build(
                FailureKind::Auth,
                AUTH_STATUS,
                "Unauthorized",
                error.to_string(),
                None,
                Value::Null,
            ),
        }
    }

    /// Replace the message, keeping `data` in sync.
    pub fn with_message(mut self, message: String) -> Self {
        if let Value::Object(data) = &mut self.data {
            data.insert("messageError".to_string(), json!(message));
        }
        self.message_error = message;
        self
    }
}

/// Rewrite any request failure into [`Error::Http`].
///
/// Authentication and configuration failures keep the typed error as the
/// source, so [`Error::auth_failure`] still finds it.
pub fn normalize(error: Error, request: &RequestConfig) -> Error {
    let normalized = match &error {
        Error::Http { .. } => return error,
        Error::Status(response) => {
            tracing::error!(
                url = %request.url,
                status = response.status,
                status_text = %response.status_text,
                "error response"
            );
            tracing::debug!(body = %response.data, "error response body");
            NormalizedError::server_responded(response, error.to_string())
        }
        Error::NoResponse(message) => {
            tracing::error!(url = %request.url, cause = %message, "request error");
            NormalizedError::no_response(error.to_string())
        }
        Error::Setup(message) => {
            tracing::error!(cause = %message, "request setup error");
            let mut normalized = NormalizedError::setup(error.to_string());
            normalized.url = Some(request.url.clone());
            normalized
        }
        Error::AuthInvariant(_) | Error::LoginFailed { .. } | Error::RefreshFailed { .. } => {
            tracing::error!(url = %request.url, error = %error, "authentication error");
            let mut normalized = NormalizedError::auth(&error);
            normalized.url = Some(request.url.clone());
            return Error::Http {
                normalized,
                source: Some(Box::new(error)),
            };
        }
        _ => {
            tracing::error!(url = %request.url, error = %error, "request setup error");
            let mut normalized = NormalizedError::setup(error.to_string());
            normalized.url = Some(request.url.clone());
            return Error::Http {
                normalized,
                source: Some(Box::new(error)),
            };
        }
    };
    Error::http(normalized)
}

/// Response interceptor installed on every client by `attach`.
#[derive(Debug, Default)]
pub struct ErrorNormalizer;

#[async_trait]
impl ResponseInterceptor for ErrorNormalizer {
    async fn on_error(
        &self,
        _client: &AuthenticatedClient,
        request: &RequestConfig,
        error: Error,
    ) -> Result<Response> {
        if request.raw {
            return Err(error);
        }
        Err(normalize(error, request))
    }
}
