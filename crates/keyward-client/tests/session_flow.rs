//! Integration tests for the login/refresh session flow.

mod common;

use common::*;
use keyward_client::{Error, FailureKind, RequestConfig};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_first_request_logs_in_then_attaches_access_token() {
    let server = MockServer::start().await;
    let access = mint_token(3600);
    let refresh = mint_token(7200);

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(EchoBody)
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "unused", 0).await;
    mount_echo_authorization(&server, "/get").await;

    let client = echo_login_client(&server, &access, &refresh);
    let response = client.get("/get").await.unwrap();

    assert_eq!(response.data["authorization"], format!("Bearer {}", access));
    assert_eq!(authorization_headers(&server, "/auth/token").await, vec![None]);
    assert!(client.tokens().is_access_valid());
    assert!(client.tokens().is_refresh_valid());
}

#[tokio::test]
async fn test_valid_session_skips_exchanges() {
    let server = MockServer::start().await;
    let access = mint_token(3600);
    mount_login(&server, "unused", "unused", 0).await;
    mount_refresh(&server, "unused", 0).await;
    mount_echo_authorization(&server, "/projects").await;

    let client = client_for(&server);
    client.update_tokens(|t| {
        t.set_access(&access);
        t.set_refresh(&mint_token(7200));
    });

    for _ in 0..3 {
        let response = client.get("/projects").await.unwrap();
        assert_eq!(response.data["authorization"], format!("Bearer {}", access));
    }
}

#[tokio::test]
async fn test_expired_access_with_valid_refresh_only_refreshes() {
    let server = MockServer::start().await;
    let refresh = mint_token(7200);
    let fresh_access = mint_token(3600);

    mount_login(&server, "unused", "unused", 0).await;
    Mock::given(method("GET"))
        .and(path("/auth/refresh"))
        .and(header("authorization", format!("Bearer {}", refresh).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": fresh_access})))
        .expect(1)
        .mount(&server)
        .await;
    mount_echo_authorization(&server, "/get").await;

    let client = client_for(&server);
    client.update_tokens(|t| {
        t.set_access(&mint_token(-60));
        t.set_refresh(&refresh);
    });

    let response = client.get("/get").await.unwrap();
    assert_eq!(response.data["authorization"], format!("Bearer {}", fresh_access));
    // the refresh token is never rotated
    assert_eq!(client.tokens().refresh().value.as_deref(), Some(refresh.as_str()));
}

#[tokio::test]
async fn test_access_within_skew_buffer_is_refreshed() {
    let server = MockServer::start().await;
    let fresh_access = mint_token(3600);

    mount_login(&server, "unused", "unused", 0).await;
    mount_refresh(&server, &fresh_access, 1).await;
    mount_echo_authorization(&server, "/get").await;

    let client = client_for(&server);
    client.update_tokens(|t| {
        t.set_access(&mint_token(5));
        t.set_refresh(&mint_token(7200));
    });

    let response = client.get("/get").await.unwrap();
    assert_eq!(response.data["authorization"], format!("Bearer {}", fresh_access));
}

#[tokio::test]
async fn test_login_with_expired_access_then_refreshes() {
    let server = MockServer::start().await;
    let fresh_access = mint_token(3600);

    mount_login(&server, &mint_token(-60), &mint_token(7200), 1).await;
    mount_refresh(&server, &fresh_access, 1).await;
    mount_echo_authorization(&server, "/get").await;

    let client = client_for(&server);
    let response = client.get("/get").await.unwrap();
    assert_eq!(response.data["authorization"], format!("Bearer {}", fresh_access));
}

#[tokio::test]
async fn test_expired_refresh_after_login_is_invariant_violation() {
    let server = MockServer::start().await;
    mount_login(&server, &mint_token(3600), &mint_token(-60), 1).await;
    mount_refresh(&server, "unused", 0).await;

    let client = client_for(&server);
    let err = client.get("/get").await.unwrap_err();
    assert!(
        matches!(err.auth_failure(), Some(Error::AuthInvariant(_))),
        "got {:?}",
        err
    );
    let normalized = err.normalized();
    assert_eq!(normalized.kind, FailureKind::Auth);
    assert_eq!(normalized.status, 401);
    assert!(normalized.error);
}

#[tokio::test]
async fn test_expired_access_after_refresh_is_invariant_violation() {
    let server = MockServer::start().await;
    mount_refresh(&server, &mint_token(-60), 1).await;

    let client = client_for(&server);
    client.update_tokens(|t| t.set_refresh(&mint_token(7200)));

    let err = client.get("/get").await.unwrap_err();
    assert!(matches!(err, Error::Http { .. }), "got {:?}", err);
    assert!(
        matches!(err.auth_failure(), Some(Error::AuthInvariant(_))),
        "got {:?}",
        err
    );
    assert_eq!(err.normalized().kind, FailureKind::Auth);
}

#[tokio::test]
async fn test_login_failure_carries_normalized_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"reason": "bad credentials"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get("/get").await.unwrap_err();

    assert!(matches!(err, Error::Http { .. }), "got {:?}", err);
    assert!(
        matches!(err.auth_failure(), Some(Error::LoginFailed { .. })),
        "got {:?}",
        err
    );
    assert!(err.is_auth_error());
    let normalized = err.normalized();
    assert_eq!(normalized.kind, FailureKind::Auth);
    assert_eq!(normalized.status, 401);
    assert!(normalized.error);
    assert_eq!(normalized.data["reason"], "bad credentials");
}

#[tokio::test]
async fn test_login_without_tokens_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": mint_token(3600)})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get("/get").await.unwrap_err();
    assert!(
        matches!(err.auth_failure(), Some(Error::LoginFailed { .. })),
        "got {:?}",
        err
    );
    assert_eq!(err.normalized().kind, FailureKind::Auth);
    assert!(!client.tokens().access().is_issued());
}

#[tokio::test]
async fn test_refresh_without_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.update_tokens(|t| t.set_refresh(&mint_token(7200)));

    let err = client.get("/get").await.unwrap_err();
    assert!(
        matches!(err.auth_failure(), Some(Error::RefreshFailed { .. })),
        "got {:?}",
        err
    );
    assert_eq!(err.normalized().kind, FailureKind::Auth);
}

#[tokio::test]
async fn test_login_path_never_carries_bearer() {
    let server = MockServer::start().await;
    mount_login(&server, &mint_token(3600), &mint_token(7200), 1).await;

    let client = client_for(&server);
    client.update_tokens(|t| {
        t.set_access(&mint_token(3600));
        t.set_refresh(&mint_token(7200));
    });

    client.post("/auth/token").await.unwrap();
    assert_eq!(authorization_headers(&server, "/auth/token").await, vec![None]);
}

#[tokio::test]
async fn test_refresh_path_carries_refresh_token() {
    let server = MockServer::start().await;
    let refresh = mint_token(7200);
    mount_refresh(&server, &mint_token(3600), 1).await;

    let client = client_for(&server);
    client.update_tokens(|t| t.set_refresh(&refresh));

    client.get("/auth/refresh").await.unwrap();
    assert_eq!(
        authorization_headers(&server, "/auth/refresh").await,
        vec![Some(format!("Bearer {}", refresh))]
    );
}

#[tokio::test]
async fn test_disabled_client_sends_no_authorization() {
    let server = MockServer::start().await;
    mount_login(&server, "unused", "unused", 0).await;
    mount_echo_authorization(&server, "/get").await;

    let client = client_for(&server);
    client.update_tokens(|t| {
        t.set_access(&mint_token(3600));
        t.set_refresh(&mint_token(7200));
    });
    client.set_mode(false);

    let response = client.get("/get").await.unwrap();
    assert!(response.data["authorization"].is_null());

    client.set_mode(true);
    let response = client.get("/get").await.unwrap();
    assert!(response.data["authorization"].is_string());
}

#[tokio::test]
async fn test_concurrent_requests_share_one_login() {
    let server = MockServer::start().await;
    mount_login(&server, &mint_token(3600), &mint_token(7200), 1).await;
    mount_refresh(&server, "unused", 0).await;
    mount_echo_authorization(&server, "/get").await;

    let client = client_for(&server);
    let requests = (0..8).map(|_| {
        let client = client.clone();
        async move { client.get("/get").await }
    });

    for result in futures::future::join_all(requests).await {
        let response = result.unwrap();
        assert!(response.data["authorization"].is_string());
    }
}

#[tokio::test]
async fn test_changed_login_path_applies_to_next_request() {
    let server = MockServer::start().await;
    mount_login(&server, "unused", "unused", 0).await;
    Mock::given(method("POST"))
        .and(path("/session/new"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": mint_token(3600), "refreshToken": mint_token(7200)})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_echo_authorization(&server, "/get").await;

    let client = client_for(&server);
    client.configure(|c| c.login_path = "/session/new".to_string());

    client.get("/get").await.unwrap();
}

#[tokio::test]
async fn test_refresh_hooks_reshape_exchange() {
    let server = MockServer::start().await;
    let fresh_access = mint_token(3600);
    Mock::given(method("GET"))
        .and(path("/auth/refresh"))
        .and(header("x-client", "keyward"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"access": fresh_access}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_echo_authorization(&server, "/get").await;

    let client = client_for(&server);
    client.configure(|c| {
        c.on_refresh_request = std::sync::Arc::new(|request: RequestConfig| {
            request.with_header(
                keyward_client::header::HeaderName::from_static("x-client"),
                keyward_client::header::HeaderValue::from_static("keyward"),
            )
        });
        c.on_refresh_response = std::sync::Arc::new(|mut response: keyward_client::Response| {
            response.data = json!({"token": response.data["data"]["access"].clone()});
            response
        });
    });
    client.update_tokens(|t| t.set_refresh(&mint_token(7200)));

    let response = client.get("/get").await.unwrap();
    assert_eq!(response.data["authorization"], format!("Bearer {}", fresh_access));
}

#[tokio::test]
async fn test_logout_notifies_endpoint_and_clears() {
    let server = MockServer::start().await;
    let access = mint_token(3600);
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", format!("Bearer {}", access).as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.update_tokens(|t| {
        t.set_access(&access);
        t.set_refresh(&mint_token(7200));
    });

    client.logout().await.unwrap();
    assert!(!client.tokens().access().is_issued());
    assert!(!client.tokens().refresh().is_issued());
}

#[tokio::test]
async fn test_logout_without_session_does_not_log_in() {
    let server = MockServer::start().await;
    mount_login(&server, "unused", "unused", 0).await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.logout().await.unwrap();
}

#[tokio::test]
async fn test_authenticate_establishes_session() {
    let server = MockServer::start().await;
    mount_login(&server, &mint_token(-60), &mint_token(7200), 1).await;
    mount_refresh(&server, &mint_token(3600), 1).await;

    let client = client_for(&server);
    client.authenticate().await.unwrap();
    assert!(client.tokens().is_access_valid());
    assert!(client.tokens().is_refresh_valid());

    // already valid, no further exchanges
    client.authenticate().await.unwrap();
}
