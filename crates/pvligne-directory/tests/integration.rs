#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use pvligne_core::config::LookupConfig;
use pvligne_core::directory::{
    DirectoryUser, HttpDirectory, Role, SEARCH_LIMIT, StaticDirectory, UserDirectory,
};
use pvligne_core::Error;
use pvligne_directory::routes::{AppState, build_router};

fn user(id: u64, username: &str, role: Role, is_validated: bool) -> DirectoryUser {
    DirectoryUser {
        id,
        username: username.to_string(),
        role,
        is_validated,
    }
}

fn directory() -> StaticDirectory {
    StaticDirectory::new(vec![
        user(1, "alice", Role::Validator, true),
        user(2, "alain", Role::User, true),
        user(3, "albert", Role::Admin, false),
        user(4, "Alex", Role::Admin, true),
        user(5, "bob", Role::User, true),
    ])
}

fn app(session: Option<&str>) -> axum::Router {
    build_router(AppState {
        directory: Arc::new(directory()),
        session: session.map(String::from),
    })
}

/// Send a request to the app and return (status, body text).
async fn send_request(
    router: axum::Router,
    uri: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, String) {
    let mut builder = Request::builder().uri(uri);
    for &(name, value) in headers {
        builder = builder.header(name, value);
    }
    let resp = router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&body).into_owned())
}

fn usernames(body: &str) -> Vec<String> {
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    json["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn prefix_search_is_case_insensitive_and_sorted() {
    let (status, body) = send_request(app(None), "/api/users/search/?q=AL", &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usernames(&body), vec!["Alex", "alain", "alice"]);
}

#[tokio::test]
async fn unvalidated_users_are_hidden() {
    let (_, body) = send_request(app(None), "/api/users/search/?q=alb", &[]).await;
    assert!(usernames(&body).is_empty());
}

#[tokio::test]
async fn records_carry_role_display() {
    let (_, body) = send_request(app(None), "/api/users/search/?q=alice", &[]).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["users"][0]["role"], "validator");
    assert_eq!(json["users"][0]["role_display"], "Validateur");
    assert_eq!(json["users"][0]["id"], 1);
}

#[tokio::test]
async fn missing_or_blank_query_lists_first_users() {
    let (_, body) = send_request(app(None), "/api/users/search/", &[]).await;
    assert_eq!(usernames(&body).len(), 4);
    let (_, body) = send_request(app(None), "/api/users/search/?q=%20%20", &[]).await;
    assert_eq!(usernames(&body).len(), 4);
}

#[tokio::test]
async fn results_are_capped() {
    let users = (0..25)
        .map(|i| user(i, &format!("user{i:02}"), Role::User, true))
        .collect();
    let router = build_router(AppState {
        directory: Arc::new(StaticDirectory::new(users)),
        session: None,
    });
    let (_, body) = send_request(router, "/api/users/search/?q=user", &[]).await;
    assert_eq!(usernames(&body).len(), SEARCH_LIMIT);
}

#[tokio::test]
async fn login_required_redirects_without_cookie() {
    let router = app(Some("s3cret"));
    let resp = router
        .oneshot(
            Request::builder()
                .uri("/api/users/search/?q=al")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
    let location = resp.headers().get("location").unwrap().to_str().unwrap();
    assert!(location.starts_with("/accounts/login/?next="), "location: {location}");
}

#[tokio::test]
async fn login_redirect_next_round_trips() {
    let original = "/api/users/search/?q=50%25+off&x=1";
    let resp = app(Some("s3cret"))
        .oneshot(Request::builder().uri(original).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let location = resp.headers().get("location").unwrap().to_str().unwrap();
    let next = location.strip_prefix("/accounts/login/?next=").unwrap();
    assert!(!next.contains(['&', '?', '+']), "next: {next}");
    assert_eq!(urlencoding::decode(next).unwrap(), original);
}

#[tokio::test]
async fn login_required_accepts_session_cookie() {
    let (status, body) = send_request(
        app(Some("s3cret")),
        "/api/users/search/?q=bob",
        &[("cookie", "csrftoken=x; sessionid=s3cret")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usernames(&body), vec!["bob"]);
}

async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn http_directory_against_server() {
    let base_url = serve(app(Some("s3cret"))).await;
    let client = HttpDirectory::new(&LookupConfig {
        base_url,
        session_cookie: Some("s3cret".into()),
        ..LookupConfig::default()
    })
    .unwrap();

    let users = client.search("ali").await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "alice");
    assert_eq!(users[0].role_display, "Validateur");
}

#[tokio::test]
async fn http_directory_without_session_gets_login_page() {
    let base_url = serve(app(Some("s3cret"))).await;
    let client = HttpDirectory::new(&LookupConfig {
        base_url,
        ..LookupConfig::default()
    })
    .unwrap();

    // The redirect lands on an HTML page, which is not a users payload.
    let err = client.search("ali").await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "got {err:?}");
}
