//! Login and refresh exchanges.
//!
//! Both go through the client's own pipeline, so the login request passes
//! `on_login_request` and its response `on_login_response` (likewise for
//! refresh) before the body is read here.

use serde::Deserialize;

use crate::client::AuthenticatedClient;
use crate::error::{Error, Result};
use crate::types::{RequestConfig, Response};

/// Body expected from the login endpoint, after `on_login_response`.
#[derive(Debug, Deserialize)]
struct LoginGrant {
    token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

/// Body expected from the refresh endpoint, after `on_refresh_response`.
#[derive(Debug, Deserialize)]
struct RefreshGrant {
    token: String,
}

/// `POST` the login path and store both tokens from the response.
pub async fn login(client: &AuthenticatedClient) -> Result<()> {
    let path = client.configuration().login_path;
    let response = client
        .request(RequestConfig::post(path))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "error while logging in");
            Error::login_failed("login request failed", Some(e))
        })?;

    let grant: LoginGrant = read_grant(&response).ok_or_else(|| {
        tracing::error!(status = response.status, "login failed, no token in response");
        Error::login_failed("no token in response", None)
    })?;

    client.update_tokens(|store| {
        store.set_access(&grant.token);
        store.set_refresh(&grant.refresh_token);
    });
    tracing::info!("logged in");
    Ok(())
}

/// `GET` the refresh path and store the new access token.
///
/// The refresh token itself is never rotated.
pub async fn refresh(client: &AuthenticatedClient) -> Result<()> {
    let path = client.configuration().refresh_path;
    let response = client
        .request(RequestConfig::get(path))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "error while refreshing access token");
            Error::refresh_failed("refresh request failed", Some(e))
        })?;

    let grant: RefreshGrant = read_grant(&response).ok_or_else(|| {
        tracing::error!(status = response.status, "refresh failed, no token in response");
        Error::refresh_failed("no token in response", None)
    })?;

    client.update_tokens(|store| store.set_access(&grant.token));
    tracing::info!("access token refreshed");
    Ok(())
}

/// The grant in a successful response. An empty `token` counts as missing.
fn read_grant<T>(response: &Response) -> Option<T>
where
    T: for<'de> Deserialize<'de> + HasToken,
{
    if !response.is_success() {
        return None;
    }
    response
        .json::<T>()
        .ok()
        .filter(|grant| !grant.token().is_empty())
}

trait HasToken {
    fn token(&self) -> &str;
}

impl HasToken for LoginGrant {
    fn token(&self) -> &str {
        &self.token
    }
}

impl HasToken for RefreshGrant {
    fn token(&self) -> &str {
        &self.token
    }
}
