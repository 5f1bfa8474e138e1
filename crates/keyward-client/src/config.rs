//! Per-client authentication configuration.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::Result;
use crate::types::{RequestConfig, Response};

/// Default login endpoint.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/token";

/// Default logout endpoint.
pub const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";

/// Default refresh endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Rewrites a request bound for the login or refresh endpoint.
pub type RequestHook = Arc<dyn Fn(RequestConfig) -> RequestConfig + Send + Sync>;

/// Reshapes a login or refresh response into the body the exchange expects.
pub type ResponseHook = Arc<dyn Fn(Response) -> Response + Send + Sync>;

fn identity_request() -> RequestHook {
    Arc::new(|request: RequestConfig| request)
}

fn identity_response() -> ResponseHook {
    Arc::new(|response: Response| response)
}

/// Parse a base URL, making sure its path ends with `/` so relative
/// request paths join beneath it.
pub fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

/// Endpoint paths and hooks of one authenticated client.
///
/// The login response hook must leave a JSON body of the form
/// `{"token": ..., "refreshToken": ...}`; the refresh response hook one of
/// the form `{"token": ...}`.
#[derive(Clone)]
pub struct ClientConfiguration {
    pub login_path: String,
    pub logout_path: String,
    pub refresh_path: String,
    pub base_url: Option<Url>,
    pub on_login_request: RequestHook,
    pub on_login_response: ResponseHook,
    pub on_refresh_request: RequestHook,
    pub on_refresh_response: ResponseHook,
}

impl ClientConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Some(parse_base_url(base_url)?);
        Ok(self)
    }

    pub fn with_on_login_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestConfig) -> RequestConfig + Send + Sync + 'static,
    {
        self.on_login_request = Arc::new(hook);
        self
    }

    pub fn with_on_login_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.on_login_response = Arc::new(hook);
        self
    }

    pub fn with_on_refresh_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestConfig) -> RequestConfig + Send + Sync + 'static,
    {
        self.on_refresh_request = Arc::new(hook);
        self
    }

    pub fn with_on_refresh_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.on_refresh_response = Arc::new(hook);
        self
    }
}

impl Default for ClientConfiguration {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            base_url: None,
            on_login_request: identity_request(),
            on_login_response: identity_response(),
            on_refresh_request: identity_request(),
            on_refresh_response: identity_response(),
        }
    }
}

impl fmt::Debug for ClientConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfiguration")
            .field("login_path", &self.login_path)
            .field("logout_path", &self.logout_path)
            .field("refresh_path", &self.refresh_path)
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

/// Optional login hooks accepted by `init_auth_with`.
#[derive(Clone, Default)]
pub struct LoginHooks {
    pub on_request: Option<RequestHook>,
    pub on_response: Option<ResponseHook>,
}

impl LoginHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestConfig) -> RequestConfig + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(hook));
        self
    }

    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.on_response = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for LoginHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginHooks")
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .finish()
    }
}
