use super::*;
use crate::session::Session;
use axum::Router;
use axum::extract::State;
use axum::http::header::LOCATION;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::routing::get;
use serde_json::json;
use std::sync::{Arc, Mutex};

// =============================================================================
// STUB AUTH SERVICE
// =============================================================================

struct StubAuth {
    status: StatusCode,
    body: String,
    seen_cookies: Mutex<Vec<String>>,
}

async fn stub_session(
    State(stub): State<Arc<StubAuth>>,
    headers: HeaderMap,
) -> (StatusCode, [(HeaderName, &'static str); 1], String) {
    let cookie = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    stub.seen_cookies.lock().expect("stub mutex should lock").push(cookie);
    // Only meaningful on 3xx; points at a sign-in page the stub does not serve.
    (stub.status, [(LOCATION, "/signin")], stub.body.clone())
}

/// Serve a stub auth service on an ephemeral port and return its base URL.
async fn spawn_stub(status: StatusCode, body: &str) -> (String, Arc<StubAuth>) {
    let stub = Arc::new(StubAuth { status, body: body.to_owned(), seen_cookies: Mutex::new(Vec::new()) });
    let app = Router::new()
        .route(SESSION_PATH, get(stub_session))
        .with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), stub)
}

fn provider(base_url: &str) -> HttpSessionProvider {
    HttpSessionProvider::new(base_url, "session_token", Duration::from_secs(5)).expect("client should build")
}

fn headers_with_cookie(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(axum::http::header::COOKIE, HeaderValue::from_str(cookie).unwrap());
    headers
}

// =============================================================================
// parse_session_body
// =============================================================================

#[test]
fn parse_bare_session_is_authenticated() {
    let lookup = parse_session_body(r#"{"user":{"name":"Ada"}}"#).unwrap();
    assert_eq!(lookup, SessionLookup::Authenticated(Session::new(json!({"user": {"name": "Ada"}}))));
}

#[test]
fn parse_envelope_unwraps_data() {
    let lookup = parse_session_body(r#"{"data":{"userId":"u1"}}"#).unwrap();
    assert_eq!(lookup, SessionLookup::Authenticated(Session::new(json!({"userId": "u1"}))));
}

#[test]
fn parse_envelope_null_data_is_unauthenticated() {
    assert_eq!(parse_session_body(r#"{"data":null}"#).unwrap(), SessionLookup::Unauthenticated);
}

#[test]
fn parse_null_and_empty_bodies_are_unauthenticated() {
    assert_eq!(parse_session_body("null").unwrap(), SessionLookup::Unauthenticated);
    assert_eq!(parse_session_body("{}").unwrap(), SessionLookup::Unauthenticated);
    assert_eq!(parse_session_body("  ").unwrap(), SessionLookup::Unauthenticated);
}

#[test]
fn parse_object_with_data_and_other_keys_is_kept_whole() {
    let lookup = parse_session_body(r#"{"data":null,"expires":"2030-01-01"}"#).unwrap();
    assert!(matches!(lookup, SessionLookup::Authenticated(_)));
}

#[test]
fn parse_invalid_json_is_parse_error() {
    assert!(matches!(parse_session_body("<html>"), Err(SessionError::Parse(_))));
}

// =============================================================================
// HttpSessionProvider
// =============================================================================

#[test]
fn session_url_trims_trailing_slash() {
    let p = provider("http://auth.local/");
    assert_eq!(p.session_url(), "http://auth.local/api/auth/session");
}

#[tokio::test]
async fn missing_cookie_skips_network_call() {
    let (base, stub) = spawn_stub(StatusCode::OK, r#"{"userId":"u1"}"#).await;
    let lookup = provider(&base).get_session(&HeaderMap::new()).await.unwrap();
    assert_eq!(lookup, SessionLookup::Unauthenticated);
    assert!(stub.seen_cookies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_cookie_value_skips_network_call() {
    let (base, stub) = spawn_stub(StatusCode::OK, r#"{"userId":"u1"}"#).await;
    let lookup = provider(&base)
        .get_session(&headers_with_cookie("session_token="))
        .await
        .unwrap();
    assert_eq!(lookup, SessionLookup::Unauthenticated);
    assert!(stub.seen_cookies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn forwards_only_the_session_cookie() {
    let (base, stub) = spawn_stub(StatusCode::OK, r#"{"userId":"u1"}"#).await;
    let lookup = provider(&base)
        .get_session(&headers_with_cookie("theme=dark; session_token=abc123; other=x"))
        .await
        .unwrap();
    assert_eq!(lookup, SessionLookup::Authenticated(Session::new(json!({"userId": "u1"}))));
    assert_eq!(*stub.seen_cookies.lock().unwrap(), vec!["session_token=abc123".to_owned()]);
}

#[tokio::test]
async fn forwards_percent_encoded_token_unchanged() {
    let (base, stub) = spawn_stub(StatusCode::OK, r#"{"userId":"u1"}"#).await;
    let p = provider(&base);
    p.get_session(&headers_with_cookie("session_token=abc%2Fdef")).await.unwrap();
    p.get_session(&headers_with_cookie("session_token=a%3B%20admin%3D1; theme=dark"))
        .await
        .unwrap();
    assert_eq!(
        *stub.seen_cookies.lock().unwrap(),
        vec!["session_token=abc%2Fdef".to_owned(), "session_token=a%3B%20admin%3D1".to_owned()]
    );
}

#[test]
fn raw_cookie_value_reads_across_multiple_cookie_headers() {
    let mut headers = headers_with_cookie("theme=dark");
    headers.append(axum::http::header::COOKIE, HeaderValue::from_static("session_token=x%20y"));
    assert_eq!(raw_cookie_value(&headers, "session_token").as_deref(), Some("x%20y"));
    assert_eq!(raw_cookie_value(&headers, "missing"), None);
}

#[tokio::test]
async fn redirect_to_sign_in_is_unauthenticated() {
    let (base, stub) = spawn_stub(StatusCode::FOUND, "").await;
    let lookup = provider(&base)
        .get_session(&headers_with_cookie("session_token=expired"))
        .await
        .unwrap();
    assert_eq!(lookup, SessionLookup::Unauthenticated);
    assert_eq!(stub.seen_cookies.lock().unwrap().len(), 1, "redirect must not be followed");
}

#[tokio::test]
async fn signed_out_body_is_unauthenticated() {
    let (base, _stub) = spawn_stub(StatusCode::OK, "{}").await;
    let lookup = provider(&base)
        .get_session(&headers_with_cookie("session_token=stale"))
        .await
        .unwrap();
    assert_eq!(lookup, SessionLookup::Unauthenticated);
}

#[tokio::test]
async fn unauthorized_status_is_unauthenticated() {
    let (base, _stub) = spawn_stub(StatusCode::UNAUTHORIZED, "").await;
    let lookup = provider(&base)
        .get_session(&headers_with_cookie("session_token=expired"))
        .await
        .unwrap();
    assert_eq!(lookup, SessionLookup::Unauthenticated);
}

#[tokio::test]
async fn server_error_is_status_error() {
    let (base, _stub) = spawn_stub(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
    let err = provider(&base)
        .get_session(&headers_with_cookie("session_token=abc"))
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::Status { status: 500 });
}

#[tokio::test]
async fn unreachable_service_is_request_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = provider(&format!("http://{addr}"))
        .get_session(&headers_with_cookie("session_token=abc"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Request(_)));
}
