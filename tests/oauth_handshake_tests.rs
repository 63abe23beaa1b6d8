mod common;

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use base64::Engine;
use item_catalog::CatalogError;
use item_catalog::config::ProviderEndpoints;
use item_catalog::middleware::auth::require_session;
use item_catalog::oauth::handshake::{self, ConnectOutcome};
use item_catalog::router::catalog_router;
use item_catalog::session::SessionState;
use serde_json::{Value, json};
use url::Url;

/// Scripted behavior for the in-process mock identity provider.
#[derive(Clone)]
struct Script {
    subject: &'static str,
    tokeninfo_user_id: &'static str,
    issued_to: &'static str,
    tokeninfo_error: Option<&'static str>,
    revoke_status: u16,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            subject: "user-123",
            tokeninfo_user_id: "user-123",
            issued_to: common::TEST_CLIENT_ID,
            tokeninfo_error: None,
            revoke_status: 200,
        }
    }
}

#[derive(Default)]
struct Counters {
    token: AtomicUsize,
    userinfo: AtomicUsize,
}

#[derive(Clone)]
struct MockProvider {
    script: Script,
    counters: Arc<Counters>,
}

fn encode_id_token(subject: &str) -> String {
    let b64 = |s: &str| base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(s);
    format!(
        "{}.{}.{}",
        b64(r#"{"alg":"none"}"#),
        b64(&format!(r#"{{"sub":"{}"}}"#, subject)),
        b64("sig")
    )
}

async fn token_endpoint(State(p): State<MockProvider>) -> Json<Value> {
    p.counters.token.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "access_token": "mock-access-token",
        "token_type": "Bearer",
        "expires_in": 3600,
        "id_token": encode_id_token(p.script.subject),
    }))
}

async fn tokeninfo_endpoint(State(p): State<MockProvider>) -> Json<Value> {
    match p.script.tokeninfo_error {
        Some(error) => Json(json!({ "error": error })),
        None => Json(json!({
            "user_id": p.script.tokeninfo_user_id,
            "issued_to": p.script.issued_to,
        })),
    }
}

async fn userinfo_endpoint(State(p): State<MockProvider>) -> Json<Value> {
    p.counters.userinfo.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "name": "Mock User", "email": "mock@example.com" }))
}

async fn revoke_endpoint(State(p): State<MockProvider>) -> StatusCode {
    StatusCode::from_u16(p.script.revoke_status).expect("scripted revoke status")
}

async fn spawn_provider(script: Script) -> (SocketAddr, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let provider = MockProvider {
        script,
        counters: counters.clone(),
    };
    let app = Router::new()
        .route("/token", post(token_endpoint))
        .route("/tokeninfo", get(tokeninfo_endpoint))
        .route("/userinfo", get(userinfo_endpoint))
        .route("/revoke", get(revoke_endpoint))
        .with_state(provider);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock provider");
    let addr = listener.local_addr().expect("mock provider addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock provider serve");
    });
    (addr, counters)
}

fn endpoints_for(addr: SocketAddr) -> ProviderEndpoints {
    let url = |path: &str| {
        Url::parse(&format!("http://{}{}", addr, path)).expect("mock provider URL")
    };
    ProviderEndpoints {
        token_url: url("/token"),
        tokeninfo_url: url("/tokeninfo"),
        userinfo_url: url("/userinfo"),
        revoke_url: url("/revoke"),
    }
}

fn session_with_nonce(nonce: &str) -> SessionState {
    SessionState {
        state: Some(nonce.to_string()),
        ..SessionState::default()
    }
}

#[tokio::test]
async fn full_handshake_establishes_session() {
    let (addr, counters) = spawn_provider(Script::default()).await;
    let app = common::test_oauth_app(endpoints_for(addr));
    let client = reqwest::Client::new();
    let mut sess = session_with_nonce("nonce123");

    let outcome = handshake::connect(&mut sess, "nonce123", "auth-code", &app, &client)
        .await
        .expect("handshake succeeds");

    assert_eq!(
        outcome,
        ConnectOutcome::Established {
            username: "Mock User".to_string()
        }
    );
    assert_eq!(sess.access_token.as_deref(), Some("mock-access-token"));
    assert_eq!(sess.provider_user_id.as_deref(), Some("user-123"));
    assert_eq!(sess.username.as_deref(), Some("Mock User"));
    assert_eq!(counters.userinfo.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mismatched_state_fails_before_any_network_call() {
    let (addr, counters) = spawn_provider(Script::default()).await;
    let app = common::test_oauth_app(endpoints_for(addr));
    let client = reqwest::Client::new();
    let mut sess = session_with_nonce("expected-nonce");

    let err = handshake::connect(&mut sess, "forged-nonce", "auth-code", &app, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::InvalidState));
    assert_eq!(counters.token.load(Ordering::SeqCst), 0);
    assert_eq!(sess.access_token, None);
    assert_eq!(sess.username, None);
}

#[tokio::test]
async fn missing_nonce_in_session_rejects_handshake() {
    let (addr, counters) = spawn_provider(Script::default()).await;
    let app = common::test_oauth_app(endpoints_for(addr));
    let client = reqwest::Client::new();
    let mut sess = SessionState::default();

    let err = handshake::connect(&mut sess, "", "auth-code", &app, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::InvalidState));
    assert_eq!(counters.token.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reconnect_of_same_user_short_circuits_without_profile_fetch() {
    let (addr, counters) = spawn_provider(Script::default()).await;
    let app = common::test_oauth_app(endpoints_for(addr));
    let client = reqwest::Client::new();
    let mut sess = session_with_nonce("nonce123");

    handshake::connect(&mut sess, "nonce123", "auth-code", &app, &client)
        .await
        .expect("first handshake succeeds");
    assert_eq!(counters.userinfo.load(Ordering::SeqCst), 1);

    let before = sess.clone();
    let outcome = handshake::connect(&mut sess, "nonce123", "auth-code", &app, &client)
        .await
        .expect("second handshake succeeds");

    assert_eq!(outcome, ConnectOutcome::AlreadyConnected);
    assert_eq!(counters.userinfo.load(Ordering::SeqCst), 1);
    assert_eq!(sess, before);
}

#[tokio::test]
async fn token_bound_to_other_user_is_rejected() {
    let (addr, counters) = spawn_provider(Script {
        tokeninfo_user_id: "someone-else",
        ..Script::default()
    })
    .await;
    let app = common::test_oauth_app(endpoints_for(addr));
    let client = reqwest::Client::new();
    let mut sess = session_with_nonce("nonce123");

    let err = handshake::connect(&mut sess, "nonce123", "auth-code", &app, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::UserIdMismatch));
    assert_eq!(sess.access_token, None);
    assert_eq!(counters.userinfo.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn token_issued_to_other_app_is_rejected() {
    let (addr, _counters) = spawn_provider(Script {
        issued_to: "other-app",
        ..Script::default()
    })
    .await;
    let app = common::test_oauth_app(endpoints_for(addr));
    let client = reqwest::Client::new();
    let mut sess = session_with_nonce("nonce123");

    let err = handshake::connect(&mut sess, "nonce123", "auth-code", &app, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::AudienceMismatch));
    assert_eq!(sess.access_token, None);
}

#[tokio::test]
async fn provider_reported_tokeninfo_error_aborts() {
    let (addr, _counters) = spawn_provider(Script {
        tokeninfo_error: Some("invalid_token"),
        ..Script::default()
    })
    .await;
    let app = common::test_oauth_app(endpoints_for(addr));
    let client = reqwest::Client::new();
    let mut sess = session_with_nonce("nonce123");

    let err = handshake::connect(&mut sess, "nonce123", "auth-code", &app, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::TokenInvalid(_)));
    assert_eq!(sess.access_token, None);
}

#[tokio::test]
async fn disconnect_without_token_is_not_connected() {
    let (addr, _counters) = spawn_provider(Script::default()).await;
    let app = common::test_oauth_app(endpoints_for(addr));
    let client = reqwest::Client::new();
    let mut sess = SessionState::default();

    let err = handshake::disconnect(&mut sess, &app, &client)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotConnected));
}

#[tokio::test]
async fn disconnect_clears_all_authenticated_fields() {
    let (addr, counters) = spawn_provider(Script::default()).await;
    let app = common::test_oauth_app(endpoints_for(addr));
    let client = reqwest::Client::new();
    let mut sess = session_with_nonce("nonce123");
    handshake::connect(&mut sess, "nonce123", "auth-code", &app, &client)
        .await
        .expect("handshake succeeds");
    assert_eq!(counters.userinfo.load(Ordering::SeqCst), 1);

    handshake::disconnect(&mut sess, &app, &client)
        .await
        .expect("disconnect succeeds");

    assert_eq!(sess.access_token, None);
    assert_eq!(sess.provider_user_id, None);
    assert_eq!(sess.username, None);
    assert!(matches!(
        require_session(&sess),
        Err(CatalogError::Unauthenticated)
    ));
}

#[tokio::test]
async fn failed_revoke_leaves_session_untouched() {
    let (addr, _counters) = spawn_provider(Script {
        revoke_status: 400,
        ..Script::default()
    })
    .await;
    let app = common::test_oauth_app(endpoints_for(addr));
    let client = reqwest::Client::new();
    let mut sess = session_with_nonce("nonce123");
    handshake::connect(&mut sess, "nonce123", "auth-code", &app, &client)
        .await
        .expect("handshake succeeds");
    let before = sess.clone();

    let err = handshake::disconnect(&mut sess, &app, &client)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::RevokeFailed));
    assert_eq!(sess, before);
}

#[tokio::test]
async fn connect_via_route_sets_flash_and_redirects() {
    let (addr, _counters) = spawn_provider(Script::default()).await;
    let (state, temp_path) = common::test_state("route-connect", endpoints_for(addr)).await;
    let sessions = state.sessions.clone();
    sessions.save("route-session", session_with_nonce("nonce123"));
    let router = catalog_router(state);

    let resp = tower::ServiceExt::oneshot(
        router,
        axum::http::Request::builder()
            .method("POST")
            .uri("/catalog?state=nonce123")
            .header(axum::http::header::COOKIE, "catalog_session=route-session")
            .body(axum::body::Body::from("auth-code"))
            .expect("failed to build request"),
    )
    .await
    .expect("request failed");

    assert!(resp.status().is_redirection());
    assert_eq!(
        resp.headers()
            .get(axum::http::header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/catalog")
    );

    let sess = sessions.load("route-session").expect("session kept");
    assert_eq!(sess.username.as_deref(), Some("Mock User"));
    assert!(sess.flash.iter().any(|m| m.contains("logged in as Mock User")));

    let _ = fs::remove_file(&temp_path);
}
