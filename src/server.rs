//! JSON HTTP API.
//!
//! Every bookmark and category route delegates to [`BookmarkService`];
//! the auth routes delegate to [`AuthProvider`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/api/fetch-page-info?url=` | Scrape title and description |
//! | `GET`    | `/api/bookmarks` | List bookmarks (`sort`, `category` repeatable, `q` optional) |
//! | `POST`   | `/api/bookmarks` | Create a bookmark (201) |
//! | `PATCH`  | `/api/bookmarks/{id}` | Update rating |
//! | `DELETE` | `/api/bookmarks/{id}` | Delete a bookmark |
//! | `DELETE` | `/api/bookmarks/clear` | Delete user-created bookmarks |
//! | `GET`    | `/api/bookmarks/export` | Download all bookmarks as JSON |
//! | `GET`    | `/api/categories` | Built-in plus user categories (`withCounts=true` optional) |
//! | `POST`   | `/api/categories` | Create a category (201) |
//! | `POST`   | `/api/auth/login` | Start a session |
//! | `POST`   | `/api/auth/logout` | End the session |
//! | `GET`    | `/api/auth/session` | Current user |
//! | `GET`    | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "validation", "message": "URL and name are required" } }
//! ```
//!
//! Codes: `validation` (400), `not_found` (404), `upstream_fetch` (400 for a
//! bad URL or non-2xx upstream, 500 for network failures and timeouts),
//! `store` (500), `unauthorized` (401).

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use markflow_core::auth::{AuthProvider, InMemorySessionStore, LoginError, User, SESSION_COOKIE};
use markflow_core::error::MarkflowError;
use markflow_core::models::{Bookmark, BookmarkInput, CategoryInput};
use markflow_core::view::{parse_category_list, SortOption, ViewQuery};

use crate::config::Config;
use crate::service::BookmarkService;

const EXPORT_FILENAME: &str = "markflow-bookmarks.json";

/// Shared state handed to every handler.
#[derive(Clone)]
struct AppState {
    service: Arc<BookmarkService>,
    auth: Arc<AuthProvider>,
}

/// Starts the server on `[server].bind` backed by the SQLite store.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = BookmarkService::from_config(config).await?;
    run_server_with(config, Arc::new(service)).await
}

/// Starts the server with a caller-supplied service.
pub async fn run_server_with(config: &Config, service: Arc<BookmarkService>) -> anyhow::Result<()> {
    let auth = Arc::new(AuthProvider::new(
        config.auth.users.clone(),
        Arc::new(InMemorySessionStore::new()),
        chrono::Duration::seconds(config.auth.session_ttl_secs),
    ));
    let app = build_router(service, auth);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Markflow listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router with permissive CORS.
pub fn build_router(service: Arc<BookmarkService>, auth: Arc<AuthProvider>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/fetch-page-info", get(handle_fetch_page_info))
        .route(
            "/api/bookmarks",
            get(handle_list_bookmarks).post(handle_create_bookmark),
        )
        .route("/api/bookmarks/clear", delete(handle_clear_bookmarks))
        .route("/api/bookmarks/export", get(handle_export))
        .route(
            "/api/bookmarks/{id}",
            patch(handle_update_rating).delete(handle_delete_bookmark),
        )
        .route(
            "/api/categories",
            get(handle_list_categories).post(handle_create_category),
        )
        .route("/api/auth/login", post(handle_login))
        .route("/api/auth/logout", post(handle_logout))
        .route("/api/auth/session", get(handle_session))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { service, auth })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<MarkflowError> for AppError {
    fn from(err: MarkflowError) -> Self {
        let status = match &err {
            MarkflowError::Validation(_) => StatusCode::BAD_REQUEST,
            MarkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            MarkflowError::UpstreamFetch { .. } if err.is_client_error() => StatusCode::BAD_REQUEST,
            MarkflowError::UpstreamFetch { .. } | MarkflowError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        // Store details are logged by the service, not returned.
        let message = match &err {
            MarkflowError::Store(_) => "Failed to process request".to_string(),
            other => other.to_string(),
        };
        AppError {
            status,
            code: err.code().to_string(),
            message,
        }
    }
}

fn validation(message: impl Into<String>) -> AppError {
    MarkflowError::validation(message).into()
}

fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized".to_string(),
        message: message.into(),
    }
}

/// Parses a JSON request body, reporting malformed JSON as a validation error.
fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| validation(format!("Invalid JSON body: {}", e)))
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

fn success() -> Json<SuccessResponse> {
    Json(SuccessResponse { success: true })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/fetch-page-info ============

#[derive(Deserialize)]
struct FetchParams {
    url: Option<String>,
}

async fn handle_fetch_page_info(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<impl IntoResponse, AppError> {
    let url = params.url.unwrap_or_default();
    let info = state.service.fetch_page_info(&url).await?;
    Ok(Json(info))
}

// ============ /api/bookmarks ============

/// Builds a [`ViewQuery`] from the raw query pairs.
///
/// `category` may repeat and each value may hold a comma-separated list.
/// For `sort` and `q` the last value wins.
fn view_query_from_pairs(pairs: Vec<(String, String)>) -> Result<ViewQuery, AppError> {
    let mut sort = None;
    let mut search = None;
    let mut categories = Vec::new();
    for (key, value) in pairs {
        match key.as_str() {
            "sort" => sort = Some(value),
            "q" => search = Some(value),
            "category" => categories.push(value),
            _ => {}
        }
    }
    let sort = sort
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<SortOption>())
        .transpose()
        .map_err(validation)?;
    Ok(ViewQuery {
        sort,
        category: parse_category_list(categories),
        search: search.filter(|q| !q.is_empty()),
    })
}

async fn handle_list_bookmarks(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Bookmark>>, AppError> {
    let query = view_query_from_pairs(pairs)?;
    Ok(Json(state.service.list_bookmarks(&query).await?))
}

async fn handle_create_bookmark(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let input: BookmarkInput = parse_body(&body)?;
    let bookmark = state.service.create_bookmark(&input).await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

async fn handle_update_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Bookmark>, AppError> {
    let payload: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();
    let bookmark = state
        .service
        .update_rating(&id, payload.get("rating"))
        .await?;
    Ok(Json(bookmark))
}

async fn handle_delete_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.service.delete_bookmark(&id).await?;
    Ok(success())
}

async fn handle_clear_bookmarks(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.service.clear_user_bookmarks().await?;
    Ok(success())
}

async fn handle_export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let export = state.service.export().await?;
    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILENAME);
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(export)))
}

// ============ /api/categories ============

#[derive(Deserialize)]
struct CategoryParams {
    #[serde(rename = "withCounts")]
    with_counts: Option<String>,
}

async fn handle_list_categories(
    State(state): State<AppState>,
    Query(params): Query<CategoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let with_counts = params.with_counts.as_deref() == Some("true");
    Ok(Json(state.service.list_categories(with_counts).await?))
}

async fn handle_create_category(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let input: CategoryInput = parse_body(&body)?;
    let category = state.service.create_category(&input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// ============ /api/auth ============

#[derive(Deserialize, Default)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    user: User,
}

#[derive(Serialize)]
struct SessionResponse {
    user: Option<User>,
}

/// Extracts the session token from the `Cookie` header.
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie(token: &str, max_age: i64) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age
    ))
    .map_err(|e| AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: e.to_string(),
    })
}

async fn handle_login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: LoginRequest = serde_json::from_slice(&body).unwrap_or_default();
    let session = state
        .auth
        .login(
            request.email.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
        )
        .map_err(|e| match e {
            LoginError::MissingFields => validation(e.to_string()),
            LoginError::InvalidCredentials => unauthorized(e.to_string()),
        })?;

    info!("session started for {}", session.user.email);
    let cookie = session_cookie(&session.token, state.auth.ttl().num_seconds())?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            user: session.user,
        }),
    ))
}

async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = session_token(&headers) {
        state.auth.logout(&token);
    }
    let cookie = session_cookie("", 0)?;
    Ok(([(header::SET_COOKIE, cookie)], success()))
}

async fn handle_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match session_token(&headers).and_then(|t| state.auth.session_user(&t)) {
        Some(user) => Json(SessionResponse { user: Some(user) }).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(SessionResponse { user: None })).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markflow_core::error::FetchFailure;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (MarkflowError::validation("x"), StatusCode::BAD_REQUEST),
            (MarkflowError::not_found("x"), StatusCode::NOT_FOUND),
            (
                MarkflowError::fetch(FetchFailure::Status(404), "x"),
                StatusCode::BAD_REQUEST,
            ),
            (
                MarkflowError::fetch(FetchFailure::Timeout, "x"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                MarkflowError::store(anyhow::anyhow!("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn test_store_message_is_generic() {
        let err = AppError::from(MarkflowError::store(anyhow::anyhow!("disk full")));
        assert_eq!(err.code, "store");
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; markflow_session=abc123; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("markflow_session="));
        assert_eq!(session_token(&empty), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_view_query_from_pairs() {
        let pair = |k: &str, v: &str| (k.to_string(), v.to_string());
        let query = view_query_from_pairs(vec![
            pair("category", "design"),
            pair("sort", "name-asc"),
            pair("category", "web-dev,news"),
            pair("q", ""),
        ])
        .unwrap();
        assert_eq!(query.category, vec!["design", "web-dev", "news"]);
        assert_eq!(query.sort, Some(SortOption::NameAsc));
        assert_eq!(query.search, None);

        let err = view_query_from_pairs(vec![pair("sort", "newest")]).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
