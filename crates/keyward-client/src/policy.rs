//! The request gate and response hook dispatch of the JWT pipeline.

use async_trait::async_trait;

use crate::client::AuthenticatedClient;
use crate::error::{Error, Result};
use crate::exchange;
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::types::{RequestConfig, Response};

/// Decides, per request, between pass-through, login, refresh and attaching
/// the access token.
///
/// In order:
/// 1. Requests to the login path go through `on_login_request` only. They
///    carry credentials, never a bearer token.
/// 2. Requests to the refresh path get the refresh token while it is valid,
///    then go through `on_refresh_request`.
/// 3. Anything else needs a valid refresh token, logging in first if there
///    is none, and a valid access token, refreshing first if there is none.
///    A token still missing after its exchange is an invariant violation.
/// 4. The access token is attached.
#[derive(Debug, Default)]
pub struct JwtRequestInterceptor;

#[async_trait]
impl RequestInterceptor for JwtRequestInterceptor {
    async fn intercept(
        &self,
        client: &AuthenticatedClient,
        mut request: RequestConfig,
    ) -> Result<RequestConfig> {
        let config = client.configuration();

        if request.url == config.login_path {
            return Ok((config.on_login_request)(request));
        }

        let is_refresh = request.url == config.refresh_path;
        if is_refresh && let Some(refresh_token) = client.valid_refresh_token() {
            request.set_bearer(&refresh_token)?;
            return Ok((config.on_refresh_request)(request));
        }

        let access_token = ensure_session(client, !is_refresh).await?;
        request.set_bearer(&access_token)?;
        Ok(request)
    }
}

/// Make sure both tokens are valid, logging in and refreshing as needed,
/// and return the access token.
///
/// `gated` serializes exchanges through the client's exchange gate. The
/// refresh exchange's own request runs ungated, since it is issued while
/// the gate is held.
async fn ensure_session(client: &AuthenticatedClient, gated: bool) -> Result<String> {
    if client.valid_refresh_token().is_some()
        && let Some(access_token) = client.valid_access_token()
    {
        return Ok(access_token);
    }

    // Concurrent callers queue here and re-check once the exchange in
    // flight has finished.
    let _gate = if gated {
        Some(client.exchange_gate().lock().await)
    } else {
        None
    };

    if client.valid_refresh_token().is_none() {
        tracing::warn!("refresh token expired or missing, logging in");
        exchange::login(client).await?;

        if client.valid_refresh_token().is_none() {
            tracing::error!("refresh token invalid after login");
            return Err(Error::AuthInvariant(
                "refresh token invalid after login".to_string(),
            ));
        }
    }

    match client.valid_access_token() {
        Some(token) => Ok(token),
        None => {
            tracing::warn!("access token expired or missing, refreshing");
            exchange::refresh(client).await?;

            client.valid_access_token().ok_or_else(|| {
                tracing::error!("access token invalid after refresh");
                Error::AuthInvariant("access token invalid after refresh".to_string())
            })
        }
    }
}

impl AuthenticatedClient {
    /// Establish a valid session without sending a request of its own.
    ///
    /// Runs the same login and refresh steps an ordinary request would.
    /// Failures come back typed rather than normalized, since no response
    /// interceptor sees them; [`Error::normalized`] renders them on demand.
    pub async fn authenticate(&self) -> Result<()> {
        ensure_session(self, true).await.map(|_| ())
    }
}

/// Applies the login and refresh response hooks to responses from those
/// endpoints.
#[derive(Debug, Default)]
pub struct JwtResponseInterceptor;

#[async_trait]
impl ResponseInterceptor for JwtResponseInterceptor {
    async fn on_response(
        &self,
        client: &AuthenticatedClient,
        response: Response,
    ) -> Result<Response> {
        let config = client.configuration();

        if response.config.url == config.login_path {
            return Ok((config.on_login_response)(response));
        }
        if response.config.url == config.refresh_path {
            return Ok((config.on_refresh_response)(response));
        }
        Ok(response)
    }
}
