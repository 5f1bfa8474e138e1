//! Common test utilities for integration tests.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use keyward_client::{AuthenticatedClient, LoginHooks, ReqwestTransport};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Mint an unsigned JWT expiring `expires_in_secs` from now.
pub fn mint_token(expires_in_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let header = json!({"alg": "none", "typ": "JWT"});
    let payload = json!({
        "exp": now + expires_in_secs,
        "iat": now,
        "sub": "1234567890",
    });
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// A client pointed at the mock server with the pipeline enabled.
pub fn client_for(server: &MockServer) -> AuthenticatedClient {
    let client = AuthenticatedClient::attach(ReqwestTransport::new().unwrap(), None);
    client.init_auth(&server.uri()).unwrap();
    client
}

/// A client whose login request carries the tokens the echo endpoint
/// sends back, in the manner of an echo service.
pub fn echo_login_client(server: &MockServer, access: &str, refresh: &str) -> AuthenticatedClient {
    let client = AuthenticatedClient::attach(ReqwestTransport::new().unwrap(), None);
    let body = json!({"token": access, "refreshToken": refresh});
    client
        .init_auth_with(
            &server.uri(),
            LoginHooks::new()
                .on_request(move |request| request.with_body(body.clone()))
                .on_response(|mut response| {
                    response.data = response.data["body"].clone();
                    response
                }),
        )
        .unwrap();
    client
}

/// Answers with `{"body": <request JSON>}`.
pub struct EchoBody;

impl Respond for EchoBody {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        ResponseTemplate::new(200).set_body_json(json!({ "body": body }))
    }
}

/// Answers with `{"authorization": <header or null>}`.
pub struct EchoAuthorization;

impl Respond for EchoAuthorization {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let authorization = request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null);
        ResponseTemplate::new(200).set_body_json(json!({ "authorization": authorization }))
    }
}

/// Login endpoint issuing the given tokens, expected `times` times.
pub async fn mount_login(server: &MockServer, access: &str, refresh: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": access, "refreshToken": refresh})),
        )
        .expect(times)
        .mount(server)
        .await;
}

/// Refresh endpoint issuing the given access token, expected `times` times.
pub async fn mount_refresh(server: &MockServer, access: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": access})))
        .expect(times)
        .mount(server)
        .await;
}

/// GET endpoint echoing the Authorization header.
pub async fn mount_echo_authorization(server: &MockServer, at: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(EchoAuthorization)
        .mount(server)
        .await;
}

/// Authorization headers of every request the server saw at `at`.
pub async fn authorization_headers(server: &MockServer, at: &str) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == at)
        .map(|r| {
            r.headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}
