use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use pvligne_core::directory::{StaticDirectory, UsersResponse};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Path of the search endpoint.
pub const SEARCH_PATH: &str = "/api/users/search/";

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/accounts/login/";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<StaticDirectory>,
    /// When set, requests must carry this `sessionid` cookie.
    pub session: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| pair.trim().strip_prefix("sessionid="))
}

/// `GET /api/users/search/?q=` — validated users whose username starts with `q`.
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if let Some(expected) = &state.session {
        if session_cookie(&headers) != Some(expected.as_str()) {
            debug!("Unauthenticated search, redirecting to login");
            let next = uri.path_and_query().map_or(SEARCH_PATH, |pq| pq.as_str());
            let location = format!("{LOGIN_PATH}?next={}", urlencoding::encode(next));
            return Redirect::to(&location).into_response();
        }
    }
    let users = state.directory.matching(&params.q);
    debug!(query = %params.q.trim(), count = users.len(), "User search");
    (StatusCode::OK, axum::Json(UsersResponse { users })).into_response()
}

/// `GET /accounts/login/` — placeholder page, like the HTML a browser would get.
pub async fn login_page() -> impl IntoResponse {
    (
        [("content-type", "text/html; charset=utf-8")],
        "<!DOCTYPE html><html><body><h1>Connexion</h1></body></html>",
    )
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(SEARCH_PATH, get(search_users))
        .route(LOGIN_PATH, get(login_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
