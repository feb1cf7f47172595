//! Transport integration tests
//!
//! Runs real requests against a loopback echo server and checks the CSRF
//! contract on the wire: token injection for in-scope mutations, untouched
//! safe methods, and no header or credential leakage to out-of-scope
//! origins.

use std::sync::Arc;

use axum::http::{HeaderMap, Method as AxumMethod};
use axum::{Json, Router};
use http::Method;
use serde_json::{json, Value};

use sanctum_admin::config::{parse_api_base, AdminConfig};
use sanctum_admin::transport::SecureTransport;

async fn echo(method: AxumMethod, headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "method": method.as_str(),
        "csrf": headers.get("x-csrf-token").and_then(|v| v.to_str().ok()),
        "cookie": headers.get("cookie").and_then(|v| v.to_str().ok()),
    }))
}

/// Start an echo server on a random loopback port, returning its base URL
async fn spawn_echo_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(echo);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn transport_for(base: &str) -> Arc<SecureTransport> {
    let config = AdminConfig {
        api_base: parse_api_base(&format!("{}/api", base)).unwrap(),
        ..AdminConfig::default()
    };

    let transport = Arc::new(SecureTransport::new(&config).unwrap());
    transport.add_session_cookie("sanctum_csrf=abc");
    transport
}

async fn send(transport: &SecureTransport, method: Method, url: &str) -> Value {
    let builder = transport.request(method, url::Url::parse(url).unwrap());
    let response = transport.send(builder).await.unwrap();
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_patch_in_scope_carries_token_and_credentials() {
    let base = spawn_echo_server().await;
    let transport = transport_for(&base);

    let body = send(
        &transport,
        Method::PATCH,
        &format!("{}/api/admin/config/FOO", base),
    )
    .await;

    assert_eq!(body["csrf"], "abc");
    assert!(body["cookie"]
        .as_str()
        .unwrap()
        .contains("sanctum_csrf=abc"));
}

#[tokio::test]
async fn test_get_in_scope_carries_credentials_but_no_token() {
    let base = spawn_echo_server().await;
    let transport = transport_for(&base);

    let body = send(
        &transport,
        Method::GET,
        &format!("{}/api/admin/config/FOO", base),
    )
    .await;

    assert_eq!(body["csrf"], Value::Null);
    assert!(body["cookie"]
        .as_str()
        .unwrap()
        .contains("sanctum_csrf=abc"));
}

#[tokio::test]
async fn test_patch_outside_base_path_is_untouched() {
    let base = spawn_echo_server().await;
    let transport = transport_for(&base);

    // Same origin, but not under the API base path: no injection and no
    // session cookie.
    let body = send(&transport, Method::PATCH, &format!("{}/other/path", base)).await;

    assert_eq!(body["csrf"], Value::Null);
    assert_eq!(body["cookie"], Value::Null);
}

#[tokio::test]
async fn test_patch_to_foreign_origin_is_untouched() {
    let base = spawn_echo_server().await;
    let foreign = spawn_echo_server().await;
    let transport = transport_for(&base);

    let body = send(
        &transport,
        Method::PATCH,
        &format!("{}/api/admin/config/FOO", foreign),
    )
    .await;

    assert_eq!(body["csrf"], Value::Null);
    assert_eq!(body["cookie"], Value::Null);
}

#[tokio::test]
async fn test_explicit_caller_token_wins() {
    let base = spawn_echo_server().await;
    let transport = transport_for(&base);

    let builder = transport
        .request(
            Method::PATCH,
            url::Url::parse(&format!("{}/api/admin/config/FOO", base)).unwrap(),
        )
        .header("x-csrf-token", "explicit");
    let response = transport.send(builder).await.unwrap();
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["csrf"], "explicit");
}

#[tokio::test]
async fn test_post_in_scope_carries_token() {
    let base = spawn_echo_server().await;
    let transport = transport_for(&base);

    let body = send(
        &transport,
        Method::POST,
        &format!("{}/api/admin/migration/execute", base),
    )
    .await;

    assert_eq!(body["csrf"], "abc");
    assert_eq!(body["method"], "POST");
}
