//! Transparent JWT session management for HTTP clients.
//!
//! [`AuthenticatedClient`] wraps a [`Transport`] and gates every outgoing
//! request on the state of an in-memory session:
//!
//! - requests to the login endpoint pass through untouched (apart from the
//!   login request hook), so they can carry credentials;
//! - requests to the refresh endpoint carry the refresh token;
//! - everything else logs in when the refresh token is missing or expired,
//!   refreshes when the access token is, and then carries the access token.
//!
//! Tokens count as expired 10 seconds before their `exp` claim. Responses
//! from the login and refresh endpoints are reshaped by user hooks into the
//! `{"token", "refreshToken"}` body the exchanges read, and every transport
//! failure is normalized into a [`NormalizedError`].
//!
//! # Example
//!
//! ```no_run
//! use keyward_client::{AuthenticatedClient, LoginHooks, ReqwestTransport, Result};
//! use serde_json::json;
//!
//! # async fn example() -> Result<()> {
//! let client = AuthenticatedClient::attach(ReqwestTransport::new()?, None);
//! client.init_auth_with(
//!     "https://api.example",
//!     LoginHooks::new()
//!         .on_request(|request| request.with_body(json!({"user": "ada", "pass": "pw"})))
//!         .on_response(|mut response| {
//!             // upstream answers {"data": {"access": ..., "refresh": ...}}
//!             let data = response.data["data"].clone();
//!             response.data = json!({
//!                 "token": data["access"],
//!                 "refreshToken": data["refresh"],
//!             });
//!             response
//!         }),
//! )?;
//!
//! match client.get("/projects").await {
//!     Ok(response) => println!("{}", response.data),
//!     Err(e) => eprintln!("{}", e.normalized().data),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod exchange;
pub mod interceptor;
pub mod mode;
pub mod normalize;
pub mod policy;
pub mod store;
pub mod transport;
pub mod types;

pub use client::AuthenticatedClient;
pub use config::{ClientConfiguration, LoginHooks, RequestHook, ResponseHook};
pub use error::{Error, Result};
pub use interceptor::{InterceptorId, RequestInterceptor, ResponseInterceptor};
pub use mode::ModeHandle;
pub use normalize::{FailureKind, NormalizedError};
pub use store::{TokenRecord, TokenStore};
pub use transport::{ReqwestTransport, Transport, TransportBuilder};
pub use types::{RequestConfig, Response};

// Re-exported so callers can build requests without depending on reqwest.
pub use reqwest::Method;
pub use reqwest::header;
