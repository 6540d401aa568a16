//! Drives `HttpDirectory` against a local axum server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;

use pvligne_core::config::LookupConfig;
use pvligne_core::directory::{HttpDirectory, UserDirectory};
use pvligne_core::Error;

async fn search(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> impl IntoResponse {
    let q = params.get("q").cloned().unwrap_or_default();
    let cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = serde_json::json!({
        "users": [
            { "username": format!("{q}-match"), "role_display": cookie },
        ]
    });
    (StatusCode::OK, axum::Json(body))
}

fn router() -> Router {
    Router::new()
        .route("/api/users/search/", get(search))
        .route(
            "/broken/api/users/search/",
            get(|| async { (StatusCode::OK, "<html>login</html>") }),
        )
        .route(
            "/down/api/users/search/",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route(
            "/empty/api/users/search/",
            get(|| async { axum::Json(serde_json::json!({ "users": [] })) }),
        )
}

async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    addr
}

fn directory(addr: SocketAddr, prefix: &str, cookie: Option<&str>) -> HttpDirectory {
    HttpDirectory::new(&LookupConfig {
        base_url: format!("http://{addr}{prefix}"),
        session_cookie: cookie.map(String::from),
        ..LookupConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn query_round_trips_decoded() {
    let addr = spawn_server().await;
    let users = directory(addr, "", None).search("é al").await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "é al-match");
}

#[tokio::test]
async fn session_cookie_is_sent() {
    let addr = spawn_server().await;
    let users = directory(addr, "", Some("abc123")).search("a").await.unwrap();
    assert_eq!(users[0].role_display, "sessionid=abc123");
}

#[tokio::test]
async fn server_error_is_status_error() {
    let addr = spawn_server().await;
    let err = directory(addr, "/down", None).search("a").await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 500, .. }), "got {err:?}");
}

#[tokio::test]
async fn html_body_is_decode_error() {
    let addr = spawn_server().await;
    let err = directory(addr, "/broken", None).search("a").await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn empty_list_is_ok() {
    let addr = spawn_server().await;
    let users = directory(addr, "/empty", None).search("zz").await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn unreachable_host_is_http_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = directory(addr, "", None).search("a").await.unwrap_err();
    assert!(matches!(err, Error::Http(_)), "got {err:?}");
}
