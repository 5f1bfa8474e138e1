//! Building an authenticated client from resolved settings.

use std::time::Duration;

use keyward_client::{
    AuthenticatedClient, ClientConfiguration, ReqwestTransport, RequestConfig, Response,
};
use serde_json::{Value, json};

use crate::{ConfigError, Result, Settings};

/// Build the client configuration: base URL, endpoint paths, and the hooks
/// implied by `[login]` and `[refresh]`.
///
/// Field mappings become response hooks that reshape upstream bodies into
/// `{"token", "refreshToken"}` (login) or `{"token"}` (refresh). A mapped
/// field missing from a response ends up `null`, which the exchange then
/// reports as a failed login or refresh.
pub fn build_configuration(settings: &Settings) -> Result<ClientConfiguration> {
    let mut config = ClientConfiguration::new();

    if let Some(base_url) = &settings.base_url {
        config = config
            .with_base_url(base_url)
            .map_err(|e| ConfigError::InvalidField {
                field: "base_url".to_string(),
                reason: e.to_string(),
            })?;
    }

    if let Some(paths) = &settings.paths {
        if let Some(login) = &paths.login {
            config = config.with_login_path(login.clone());
        }
        if let Some(logout) = &paths.logout {
            config = config.with_logout_path(logout.clone());
        }
        if let Some(refresh) = &paths.refresh {
            config = config.with_refresh_path(refresh.clone());
        }
    }

    if let Some(login) = &settings.login {
        if let Some(body) = &login.body {
            let body = Value::Object(body.clone());
            config = config
                .with_on_login_request(move |request: RequestConfig| request.with_body(body.clone()));
        }

        if login.token_field.is_some() || login.refresh_token_field.is_some() {
            let token = field_pointer(
                "login.token_field",
                login.token_field.as_deref().unwrap_or("token"),
            )?;
            let refresh_token = field_pointer(
                "login.refresh_token_field",
                login.refresh_token_field.as_deref().unwrap_or("refreshToken"),
            )?;
            config = config.with_on_login_response(move |mut response: Response| {
                response.data = json!({
                    "token": lookup(&response.data, &token),
                    "refreshToken": lookup(&response.data, &refresh_token),
                });
                response
            });
        }
    }

    if let Some(refresh) = &settings.refresh
        && let Some(field) = &refresh.token_field
    {
        let token = field_pointer("refresh.token_field", field)?;
        config = config.with_on_refresh_response(move |mut response: Response| {
            response.data = json!({ "token": lookup(&response.data, &token) });
            response
        });
    }

    Ok(config)
}

/// Build the HTTP transport from `[transport]`.
pub fn build_transport(settings: &Settings) -> Result<ReqwestTransport> {
    let mut builder = ReqwestTransport::builder();
    if let Some(transport) = &settings.transport {
        if let Some(secs) = transport.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(agent) = &transport.user_agent {
            builder = builder.user_agent(agent.clone());
        }
    }
    Ok(builder.build()?)
}

/// Build a client with the authentication pipeline enabled.
pub fn build_client(settings: &Settings) -> Result<AuthenticatedClient> {
    if settings.base_url.is_none() {
        return Err(ConfigError::MissingField {
            field: "base_url".to_string(),
            context: "settings".to_string(),
        });
    }

    let config = build_configuration(settings)?;
    let transport = build_transport(settings)?;
    let client = AuthenticatedClient::attach(transport, Some(config));
    client.enable();
    Ok(client)
}

/// Turn a dotted field path (`data.access`) into a JSON pointer.
fn field_pointer(field: &str, path: &str) -> Result<String> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(ConfigError::InvalidField {
            field: field.to_string(),
            reason: format!("'{}' is not a dotted field path", path),
        });
    }
    Ok(path
        .split('.')
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect())
}

fn lookup(data: &Value, pointer: &str) -> Value {
    data.pointer(pointer).cloned().unwrap_or(Value::Null)
}
