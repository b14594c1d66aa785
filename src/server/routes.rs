use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Extension, Json, Router,
};
use nutrilog_core::store::tree;
use nutrilog_core::{DbPath, FileStore, RemoteStore, StoreError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, can_access, AuthUser};
use super::config::ApiKeyStore;
use super::ws;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FileStore>,
    pub api_keys: Arc<ApiKeyStore>,
}

impl AppState {
    pub fn new(store: FileStore, api_keys: ApiKeyStore) -> Self {
        Self {
            store: Arc::new(store),
            api_keys: Arc::new(api_keys),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Forbidden(String),
    BadRequest(String),
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Forbidden(path) => (
                StatusCode::FORBIDDEN,
                "forbidden",
                format!("No access to '{}'", path),
            ),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            ApiError::Store(e) => match e {
                StoreError::InvalidPath { .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_path", e.to_string())
                }
                StoreError::Serialization(_) => {
                    (StatusCode::BAD_REQUEST, "invalid_value", e.to_string())
                }
                StoreError::PreconditionFailed(_) => (
                    StatusCode::PRECONDITION_FAILED,
                    "precondition_failed",
                    e.to_string(),
                ),
                other => {
                    tracing::error!("Store error: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "store_error",
                        other.to_string(),
                    )
                }
            },
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// Parses `raw` and checks that `user` may touch it.
pub(crate) fn authorize(user: &AuthUser, raw: &str) -> Result<DbPath, ApiError> {
    let path = DbPath::parse(raw)?;
    if !can_access(&user.user_id, &path) {
        tracing::debug!("Denied {} access to {}", user.user_id, path);
        return Err(ApiError::Forbidden(path.to_string()));
    }
    Ok(path)
}

fn quoted_etag(value: Option<&Value>) -> String {
    format!("\"{}\"", tree::etag(value))
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The tree root is never readable or writable over the wire.
async fn root(Extension(_user): Extension<AuthUser>) -> ApiError {
    ApiError::Forbidden("/".to_string())
}

/// Value at a path, or a filtered object of its children when query
/// parameters (`orderBy`, `startAt`, `endAt`, `limitToFirst`) are given.
async fn read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let path = authorize(&user, &raw)?;

    let query = tree::Query::from_params(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if let Some(query) = query {
        let children: Map<String, Value> =
            state.store.query(&path, &query).await?.into_iter().collect();
        return Ok(Json(Value::Object(children)).into_response());
    }

    let value = state.store.get(&path).await?;
    let etag = quoted_etag(value.as_ref());
    Ok(([(header::ETAG, etag)], Json(value.unwrap_or(Value::Null))).into_response())
}

/// Replaces the value at a path. With `If-Match` the write only happens if
/// the stored value still has that ETag.
async fn write(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw): Path<String>,
    headers: HeaderMap,
    Json(value): Json<Value>,
) -> Result<Response, ApiError> {
    let path = authorize(&user, &raw)?;

    let if_match = headers
        .get(header::IF_MATCH)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().trim_matches('"').to_string());

    let stored = match if_match {
        Some(etag) => state.store.compare_and_set(&path, &etag, value).await?,
        None => {
            state.store.set(&path, value).await?;
            state.store.get(&path).await?
        }
    };

    let etag = quoted_etag(stored.as_ref());
    Ok(([(header::ETAG, etag)], Json(stored.unwrap_or(Value::Null))).into_response())
}

/// Multi-child update. Every key is checked as a path of its own.
async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let path = authorize(&user, &raw)?;
    let Value::Object(children) = body else {
        return Err(ApiError::BadRequest(
            "PATCH body must be a JSON object".to_string(),
        ));
    };

    for key in children.keys() {
        let child = path.join(key)?;
        if !can_access(&user.user_id, &child) {
            return Err(ApiError::Forbidden(child.to_string()));
        }
    }

    state.store.update(&path, children).await?;
    let value = state.store.get(&path).await?;
    Ok(Json(value.unwrap_or(Value::Null)))
}

#[derive(Serialize)]
struct PushResponse {
    name: String,
}

/// Appends under a new push id.
async fn append(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<PushResponse>, ApiError> {
    let path = authorize(&user, &raw)?;
    let name = state.store.push(&path, value).await?;
    Ok(Json(PushResponse { name }))
}

async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let path = authorize(&user, &raw)?;
    state.store.remove(&path).await?;
    Ok(Json(Value::Null))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new().route("/health", get(health));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/db", any(root))
        .route(
            "/db/{*path}",
            get(read)
                .put(write)
                .patch(update)
                .post(append)
                .delete(remove),
        )
        .route("/ws", any(root))
        .route("/ws/{*path}", get(ws::subscribe))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
