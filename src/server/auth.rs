use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use nutrilog_core::paths;
use nutrilog_core::DbPath;
use serde::Serialize;

use super::routes::AppState;

/// Authenticated user info, stored in request extensions
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
}

/// Error response for auth failures
#[derive(Serialize)]
pub struct AuthError {
    pub error: &'static str,
    pub message: &'static str,
}

pub(crate) fn auth_error(
    status: StatusCode,
    error: &'static str,
    message: &'static str,
) -> Response {
    (status, Json(AuthError { error, message })).into_response()
}

/// Key passed as `?key=` (browsers cannot set headers on WebSocket upgrades).
fn query_key(request: &Request) -> Option<String> {
    request.uri().query()?.split('&').find_map(|pair| {
        let value = pair.strip_prefix("key=")?;
        urlencoding::decode(value).ok().map(|v| v.into_owned())
    })
}

/// Middleware that validates the API key and inserts [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
        Some(_) => {
            return auth_error(
                StatusCode::UNAUTHORIZED,
                "invalid_auth",
                "Authorization header must use Bearer scheme",
            );
        }
        None => match query_key(&request) {
            Some(key) => key,
            None => {
                return auth_error(
                    StatusCode::UNAUTHORIZED,
                    "missing_auth",
                    "Authorization header or key parameter required",
                );
            }
        },
    };

    match state.api_keys.validate(&api_key) {
        Some(user_id) => {
            let user = AuthUser {
                user_id: user_id.to_string(),
            };
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => auth_error(StatusCode::UNAUTHORIZED, "invalid_key", "Invalid API key"),
    }
}

/// Whether `user_id` may read or write `path`.
///
/// The root is off limits. Inside a per-user collection only the owner's
/// subtree is reachable; shared collections are open to every user.
pub fn can_access(user_id: &str, path: &DbPath) -> bool {
    match path.segments().first() {
        None => false,
        Some(collection) if paths::USER_SCOPED.contains(&collection.as_str()) => {
            paths::owner_of(path) == Some(user_id)
        }
        Some(_) => true,
    }
}
