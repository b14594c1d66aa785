//! Client for `nutrilog-server`.
//!
//! Reads and writes go over REST at `{base}/db/{path}`; subscriptions open a
//! WebSocket at `{base}/ws/{path}` and receive one text frame per snapshot.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::header::{AUTHORIZATION, ETAG, IF_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::error::StoreError;
use super::path::DbPath;
use super::tree::Query;
use super::{RemoteStore, Snapshot, SnapshotStream, TxAction, TxOutcome};

/// Attempts before a contended transaction gives up.
pub const MAX_TRANSACTION_ATTEMPTS: u32 = 25;

#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn db_url(&self, path: &DbPath) -> String {
        if path.is_root() {
            format!("{}/db", self.base_url)
        } else {
            format!("{}/db/{}", self.base_url, encode_path(path))
        }
    }

    /// WebSocket URL for `path`; the key travels as a query parameter.
    fn ws_url(&self, path: &DbPath) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if !self.base_url.starts_with("ws://") && !self.base_url.starts_with("wss://") {
            format!("ws://{}", self.base_url)
        } else {
            self.base_url.clone()
        };

        let mut url = if path.is_root() {
            format!("{}/ws", base)
        } else {
            format!("{}/ws/{}", base, encode_path(path))
        };
        if let Some(key) = &self.api_key {
            url.push_str("?key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }

    fn request(&self, method: Method, path: &DbPath) -> RequestBuilder {
        let builder = self.client.request(method, self.db_url(path));
        match &self.api_key {
            Some(key) => builder.header(AUTHORIZATION, format!("Bearer {}", key)),
            None => builder,
        }
    }

    /// Value at `path` together with its ETag.
    async fn get_with_etag(&self, path: &DbPath) -> Result<(Option<Value>, String), StoreError> {
        let response = check(self.request(Method::GET, path).send().await?).await?;
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.trim_matches('"').to_string())
            .ok_or_else(|| StoreError::Http("response is missing an ETag".to_string()))?;
        let value = non_null(response.json().await?);
        Ok((value, etag))
    }
}

fn encode_path(path: &DbPath) -> String {
    path.segments()
        .iter()
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other),
    }
}

/// Turns non-success statuses into [`StoreError::Status`].
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or(text);
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn get(&self, path: &DbPath) -> Result<Option<Value>, StoreError> {
        let response = check(self.request(Method::GET, path).send().await?).await?;
        Ok(non_null(response.json().await?))
    }

    async fn query(
        &self,
        path: &DbPath,
        query: &Query,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        let response = check(
            self.request(Method::GET, path)
                .query(&query.to_params())
                .send()
                .await?,
        )
        .await?;
        // The server filters; JSON objects do not keep order, so re-apply locally.
        let filtered: Value = response.json().await?;
        Ok(query.apply(Some(&filtered)))
    }

    async fn set(&self, path: &DbPath, value: Value) -> Result<(), StoreError> {
        check(self.request(Method::PUT, path).json(&value).send().await?).await?;
        Ok(())
    }

    async fn update(&self, path: &DbPath, children: Map<String, Value>) -> Result<(), StoreError> {
        check(
            self.request(Method::PATCH, path)
                .json(&children)
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn push(&self, path: &DbPath, value: Value) -> Result<String, StoreError> {
        let response = check(self.request(Method::POST, path).json(&value).send().await?).await?;
        let body: PushResponse = response.json().await?;
        Ok(body.name)
    }

    async fn remove(&self, path: &DbPath) -> Result<(), StoreError> {
        check(self.request(Method::DELETE, path).send().await?).await?;
        Ok(())
    }

    async fn transaction(
        &self,
        path: &DbPath,
        update: &(dyn Fn(Option<Value>) -> TxAction + Send + Sync),
    ) -> Result<TxOutcome, StoreError> {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            let (current, etag) = self.get_with_etag(path).await?;
            let next = match update(current.clone()) {
                TxAction::Abort => {
                    return Ok(TxOutcome {
                        committed: false,
                        value: current,
                        attempts: attempt,
                    })
                }
                TxAction::Commit(next) => next.unwrap_or(Value::Null),
            };

            let response = self
                .request(Method::PUT, path)
                .header(IF_MATCH, format!("\"{}\"", etag))
                .json(&next)
                .send()
                .await?;
            if response.status() == StatusCode::PRECONDITION_FAILED {
                tracing::debug!("Transaction at {} lost a race (attempt {})", path, attempt);
                continue;
            }
            let stored: Value = check(response).await?.json().await?;
            return Ok(TxOutcome {
                committed: true,
                value: non_null(stored),
                attempts: attempt,
            });
        }

        Err(StoreError::TransactionConflict {
            path: path.to_string(),
            attempts: MAX_TRANSACTION_ATTEMPTS,
        })
    }

    fn watch(&self, path: &DbPath) -> SnapshotStream {
        let state = WsState::Connecting(self.ws_url(path));
        let path = path.clone();

        stream::unfold(state, move |state| {
            let path = path.clone();
            async move {
                let mut socket = match state {
                    WsState::Connecting(url) => match connect_async(url.as_str()).await {
                        Ok((socket, _)) => Box::new(socket),
                        Err(e) => {
                            let err = StoreError::WebSocket(e.to_string());
                            return Some((Err(err), WsState::Done));
                        }
                    },
                    WsState::Open(socket) => socket,
                    WsState::Done => return None,
                };

                loop {
                    match socket.next().await {
                        Some(Ok(Message::Text(text))) => {
                            let item = serde_json::from_str::<Value>(text.as_str())
                                .map(|v| Snapshot::new(path.clone(), non_null(v)))
                                .map_err(StoreError::from);
                            return Some((item, WsState::Open(socket)));
                        }
                        Some(Ok(Message::Close(_))) | None => return None,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            let err = StoreError::WebSocket(e.to_string());
                            return Some((Err(err), WsState::Done));
                        }
                    }
                }
            }
        })
        .boxed()
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum WsState {
    Connecting(String),
    Open(Box<Socket>),
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_url_encodes_segments() {
        let store = HttpStore::new("http://localhost:8080/", None);
        let path = DbPath::parse("alimentos/caf\u{e9} con leche").unwrap();
        assert_eq!(
            store.db_url(&path),
            "http://localhost:8080/db/alimentos/caf%C3%A9%20con%20leche"
        );
        assert_eq!(store.db_url(&DbPath::root()), "http://localhost:8080/db");
    }

    #[test]
    fn test_ws_url_schemes() {
        let path = DbPath::parse("perfiles/u1").unwrap();

        let plain = HttpStore::new("http://localhost:8080", Some("k 1".to_string()));
        assert_eq!(plain.ws_url(&path), "ws://localhost:8080/ws/perfiles/u1?key=k%201");

        let tls = HttpStore::new("https://sync.example.com", None);
        assert_eq!(tls.ws_url(&path), "wss://sync.example.com/ws/perfiles/u1");

        let bare = HttpStore::new("localhost:9000", None);
        assert_eq!(bare.ws_url(&path), "ws://localhost:9000/ws/perfiles/u1");
    }
}
