//! Client error types.

use thiserror::Error;

use crate::normalize::NormalizedError;
use crate::types::Response;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A failure rewritten by the error normalizer.
    ///
    /// `source` keeps the typed error behind authentication and setup
    /// failures; see [`Error::auth_failure`].
    #[error(
        "HTTP {} ({}): {}",
        .normalized.status,
        .normalized.status_text,
        .normalized.message_error
    )]
    Http {
        normalized: NormalizedError,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Server responded with a non-success status.
    ///
    /// Only surfaces unnormalized for requests flagged `raw`.
    #[error("server responded with status {}", .0.status)]
    Status(Box<Response>),

    /// Request was sent but no response was received.
    #[error("no response received: {0}")]
    NoResponse(String),

    /// Request never left the client.
    #[error("request setup failed: {0}")]
    Setup(String),

    /// A token was still unusable after the exchange that should have
    /// produced it.
    #[error("authentication invariant violated: {0}")]
    AuthInvariant(String),

    /// The login exchange yielded no usable token.
    #[error("login failed: {message}")]
    LoginFailed {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// The refresh exchange yielded no usable token.
    #[error("refresh failed: {message}")]
    RefreshFailed {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn login_failed(message: impl Into<String>, source: Option<Error>) -> Self {
        Error::LoginFailed {
            message: message.into(),
            source: source.map(Box::new),
        }
    }

    pub(crate) fn refresh_failed(message: impl Into<String>, source: Option<Error>) -> Self {
        Error::RefreshFailed {
            message: message.into(),
            source: source.map(Box::new),
        }
    }

    pub(crate) fn http(normalized: NormalizedError) -> Self {
        Error::Http {
            normalized,
            source: None,
        }
    }

    /// Check if this error came out of the authentication layer.
    pub fn is_auth_error(&self) -> bool {
        self.auth_failure().is_some() || self.status() == Some(401)
    }

    /// The typed authentication failure behind this error, normalized or not.
    pub fn auth_failure(&self) -> Option<&Error> {
        match self {
            Error::AuthInvariant(_) | Error::LoginFailed { .. } | Error::RefreshFailed { .. } => {
                Some(self)
            }
            Error::Http {
                source: Some(source),
                ..
            } => source.auth_failure(),
            _ => None,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Upstream or normalized HTTP status, when one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { normalized, .. } => Some(normalized.status),
            Error::Status(response) => Some(response.status),
            _ => None,
        }
    }

    /// Render any error into the uniform normalized shape.
    ///
    /// Authentication failures take the shape of the failure underneath
    /// them when there is one. Everything else that never reached the
    /// network is a setup failure.
    pub fn normalized(&self) -> NormalizedError {
        match self {
            Error::Http { normalized, .. } => normalized.clone(),
            Error::Status(response) => {
                NormalizedError::server_responded(response, self.to_string())
            }
            Error::NoResponse(message) => NormalizedError::no_response(message.clone()),
            Error::AuthInvariant(_) | Error::LoginFailed { .. } | Error::RefreshFailed { .. } => {
                NormalizedError::auth(self)
            }
            _ => NormalizedError::setup(self.to_string()),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
