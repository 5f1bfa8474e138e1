//! Main client implementation.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::config::{ClientConfiguration, LoginHooks, parse_base_url};
use crate::error::{Error, Result};
use crate::interceptor::{InterceptorId, Interceptors, RequestInterceptor, ResponseInterceptor};
use crate::mode::ModeHandle;
use crate::normalize::ErrorNormalizer;
use crate::store::TokenStore;
use crate::transport::Transport;
use crate::types::{RequestConfig, Response};

/// HTTP client with transparent JWT session handling.
///
/// Wraps a [`Transport`] and owns the session state layered on top of it:
/// the token store, the endpoint configuration, the interceptor registries
/// and the handle of the installed authentication pipeline. Clones share
/// that state.
///
/// # Example
///
/// ```no_run
/// use keyward_client::{AuthenticatedClient, LoginHooks, ReqwestTransport};
/// use serde_json::json;
///
/// # async fn example() -> keyward_client::Result<()> {
/// let client = AuthenticatedClient::attach(ReqwestTransport::new()?, None);
/// client.init_auth_with(
///     "https://api.example",
///     LoginHooks::new().on_request(|request| {
///         request.with_body(json!({"username": "ada", "password": "hunter2"}))
///     }),
/// )?;
///
/// // Logs in on first use, then sends `Authorization: Bearer <access token>`.
/// let response = client.get("/projects").await?;
/// println!("{}", response.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthenticatedClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
struct ClientInner {
    transport: Arc<dyn Transport>,
    config: RwLock<ClientConfiguration>,
    store: RwLock<TokenStore>,
    /// Lock order: `mode` before `interceptors`.
    mode: Mutex<ModeHandle>,
    interceptors: RwLock<Interceptors>,
    /// Serializes login/refresh exchanges started by ordinary requests.
    exchange_gate: tokio::sync::Mutex<()>,
}

impl AuthenticatedClient {
    /// Wrap a transport.
    ///
    /// Error normalization is installed immediately. The authentication
    /// pipeline stays detached until [`init_auth`](Self::init_auth) or
    /// [`enable`](Self::enable).
    pub fn attach<T: Transport + 'static>(
        transport: T,
        config: Option<ClientConfiguration>,
    ) -> Self {
        Self::attach_shared(Arc::new(transport), config)
    }

    /// Wrap a transport shared with other clients.
    pub fn attach_shared(
        transport: Arc<dyn Transport>,
        config: Option<ClientConfiguration>,
    ) -> Self {
        let mut interceptors = Interceptors::default();
        interceptors.response.register(Arc::new(ErrorNormalizer));

        Self {
            inner: Arc::new(ClientInner {
                transport,
                config: RwLock::new(config.unwrap_or_default()),
                store: RwLock::new(TokenStore::new()),
                mode: Mutex::new(ModeHandle::Detached),
                interceptors: RwLock::new(interceptors),
                exchange_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Reset the configuration and session of this client.
    ///
    /// A base URL already set is kept unless `config` carries one. If the
    /// pipeline was attached it is removed and installed again, so a client
    /// never ends up with two pipelines.
    pub fn reattach(&self, config: Option<ClientConfiguration>) {
        let was_attached = self.mode().is_attached();
        if was_attached {
            tracing::warn!(
                "JWT mode is already enabled on this client; configuration will be reset"
            );
            self.disable();
        }

        let mut config = config.unwrap_or_default();
        if config.base_url.is_none() {
            config.base_url = self.inner.config.read().base_url.clone();
        }
        *self.inner.config.write() = config;
        *self.inner.store.write() = TokenStore::new();

        if was_attached {
            self.enable();
        }
    }

    /// Set the base URL, start a fresh session and enable the pipeline.
    pub fn init_auth(&self, base_url: &str) -> Result<()> {
        self.init_auth_with(base_url, LoginHooks::default())
    }

    /// Like [`init_auth`](Self::init_auth), also installing login hooks.
    pub fn init_auth_with(&self, base_url: &str, hooks: LoginHooks) -> Result<()> {
        let base_url = parse_base_url(base_url)?;
        {
            let mut config = self.inner.config.write();
            config.base_url = Some(base_url);
            if let Some(hook) = hooks.on_request {
                config.on_login_request = hook;
            }
            if let Some(hook) = hooks.on_response {
                config.on_login_response = hook;
            }
        }
        *self.inner.store.write() = TokenStore::new();
        self.enable();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration and session state
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot of the current configuration.
    pub fn configuration(&self) -> ClientConfiguration {
        self.inner.config.read().clone()
    }

    /// Change the configuration. Takes effect on the next request.
    ///
    /// The closure runs under the configuration write lock and must not
    /// call back into the client; doing so deadlocks.
    pub fn configure<F>(&self, f: F)
    where
        F: FnOnce(&mut ClientConfiguration),
    {
        f(&mut *self.inner.config.write());
    }

    /// Get the base URL.
    pub fn base_url(&self) -> Option<Url> {
        self.inner.config.read().base_url.clone()
    }

    /// Snapshot of the token store.
    pub fn tokens(&self) -> TokenStore {
        self.inner.store.read().clone()
    }

    /// Change the token store directly.
    ///
    /// The closure runs under the token store write lock and must not call
    /// back into the client; doing so deadlocks. Read what it needs first.
    pub fn update_tokens<F>(&self, f: F)
    where
        F: FnOnce(&mut TokenStore),
    {
        f(&mut *self.inner.store.write());
    }

    pub(crate) fn valid_access_token(&self) -> Option<String> {
        self.inner.store.read().valid_access()
    }

    pub(crate) fn valid_refresh_token(&self) -> Option<String> {
        self.inner.store.read().valid_refresh()
    }

    pub(crate) fn exchange_gate(&self) -> &tokio::sync::Mutex<()> {
        &self.inner.exchange_gate
    }

    /// End the session.
    ///
    /// Notifies the logout endpoint when the session is still fully valid,
    /// so logging out never triggers a login. Tokens are cleared whatever
    /// the endpoint answers.
    pub async fn logout(&self) -> Result<()> {
        let notify = self.mode().is_attached() && {
            let store = self.inner.store.read();
            store.is_access_valid() && store.is_refresh_valid()
        };

        let outcome = if notify {
            let path = self.configuration().logout_path;
            self.post(&path).await.map(|_| ())
        } else {
            Ok(())
        };

        self.inner.store.write().clear_all();
        tracing::info!("session cleared");
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Interceptors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn register_request_interceptor(
        &self,
        interceptor: Arc<dyn RequestInterceptor>,
    ) -> InterceptorId {
        self.inner.interceptors.write().request.register(interceptor)
    }

    pub fn register_response_interceptor(
        &self,
        interceptor: Arc<dyn ResponseInterceptor>,
    ) -> InterceptorId {
        self.inner.interceptors.write().response.register(interceptor)
    }

    pub fn eject_request_interceptor(&self, id: InterceptorId) -> bool {
        self.inner.interceptors.write().request.eject(id)
    }

    pub fn eject_response_interceptor(&self, id: InterceptorId) -> bool {
        self.inner.interceptors.write().response.eject(id)
    }

    pub fn request_interceptor_ids(&self) -> Vec<InterceptorId> {
        self.inner.interceptors.read().request.ids()
    }

    pub fn response_interceptor_ids(&self) -> Vec<InterceptorId> {
        self.inner.interceptors.read().response.ids()
    }

    pub(crate) fn mode_handle(&self) -> &Mutex<ModeHandle> {
        &self.inner.mode
    }

    pub(crate) fn interceptors(&self) -> &RwLock<Interceptors> {
        &self.inner.interceptors
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Make a GET request.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.request(RequestConfig::get(url)).await
    }

    /// Make a POST request without a body.
    pub async fn post(&self, url: &str) -> Result<Response> {
        self.request(RequestConfig::post(url)).await
    }

    /// Make a POST request.
    pub async fn post_json<B>(&self, url: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.send_json(Method::POST, url, body).await
    }

    /// Make a PUT request.
    pub async fn put_json<B>(&self, url: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PUT, url, body).await
    }

    /// Make a PATCH request.
    pub async fn patch_json<B>(&self, url: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PATCH, url, body).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.request(RequestConfig::new(Method::DELETE, url)).await
    }

    async fn send_json<B>(&self, method: Method, url: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(RequestConfig::new(method, url).with_body(body))
            .await
    }

    /// Run a request through the interceptor pipeline and the transport.
    ///
    /// Boxed because login and refresh exchanges issue requests from inside
    /// the pipeline.
    pub fn request(&self, request: RequestConfig) -> BoxFuture<'_, Result<Response>> {
        Box::pin(async move {
            let (request_chain, response_chain) = {
                let interceptors = self.inner.interceptors.read();
                (
                    interceptors.request.snapshot(),
                    interceptors.response.snapshot(),
                )
            };

            let mut request = request;
            let mut failure = None;
            for interceptor in &request_chain {
                match interceptor.intercept(self, request.clone()).await {
                    Ok(next) => request = next,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            let mut outcome = match failure {
                Some(e) => Err(e),
                None => self.dispatch(&request).await,
            };

            for interceptor in &response_chain {
                outcome = match outcome {
                    Ok(response) => interceptor.on_response(self, response).await,
                    Err(error) => interceptor.on_error(self, &request, error).await,
                };
            }
            outcome
        })
    }

    async fn dispatch(&self, request: &RequestConfig) -> Result<Response> {
        let url = self.resolve_url(&request.url)?;
        tracing::debug!(method = %request.method, %url, "sending request");

        let response = self.inner.transport.send(request, url).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(Error::Status(Box::new(response)))
        }
    }

    /// Absolute URLs are used as-is; anything else joins onto the base URL.
    fn resolve_url(&self, url: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }

        let base = self.base_url().ok_or_else(|| {
            Error::Setup(format!("relative url '{}' requires a base URL", url))
        })?;
        base.join(url.trim_start_matches('/'))
            .map_err(|e| Error::Setup(format!("invalid url '{}': {}", url, e)))
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("config", &*self.inner.config.read())
            .field("mode", &*self.inner.mode.lock())
            .finish_non_exhaustive()
    }
}
