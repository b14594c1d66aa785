//! The nutrilog store server: the JSON tree over REST and WebSocket.
//!
//! # Endpoints
//!
//! - `GET /health`: health check (no auth)
//! - `GET|PUT|PATCH|POST|DELETE /db/{path}`: read, replace, update, push, remove
//! - `GET /ws/{path}`: WebSocket subscription, one JSON frame per snapshot
//!
//! Every other route needs an API key, either as `Authorization: Bearer <key>`
//! or as a `key` query parameter.

pub mod auth;
pub mod config;
pub mod routes;
pub mod ws;

pub use auth::{can_access, AuthUser};
pub use config::{ApiKeyEntry, ApiKeyStore, Config};
pub use routes::{router, AppState};
