//! Live subscriptions.
//!
//! A client opens `/ws/{path}` and receives the current value as one JSON text
//! frame, then another frame every time a write changes it. Absent values are
//! sent as `null`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    Extension,
};
use futures::{SinkExt, StreamExt};
use nutrilog_core::{DbPath, RemoteStore};
use serde_json::Value;

use super::auth::AuthUser;
use super::routes::{authorize, ApiError, AppState};

pub async fn subscribe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let path = authorize(&user, &raw)?;
    tracing::debug!("{} subscribed to {}", user.user_id, path);
    Ok(ws.on_upgrade(move |socket| forward(socket, state, path)))
}

async fn forward(socket: WebSocket, state: AppState, path: DbPath) {
    let (mut sender, mut receiver) = socket.split();
    let mut snapshots = state.store.watch(&path);

    loop {
        tokio::select! {
            snapshot = snapshots.next() => match snapshot {
                Some(Ok(snapshot)) => {
                    let text = snapshot.value.unwrap_or(Value::Null).to_string();
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!("Subscription to {} failed: {}", path, e);
                    break;
                }
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!("Subscriber to {} went away: {}", path, e);
                    break;
                }
                // Pings are answered by the socket itself.
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = sender.send(Message::Close(None)).await;
    tracing::debug!("Subscription to {} closed", path);
}
