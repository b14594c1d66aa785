//! Remote hierarchical key-value store.
//!
//! Every record the app keeps lives at a slash-separated path in one JSON
//! tree. Three backends implement [`RemoteStore`]:
//!
//! - [`MemoryStore`]: in-process tree, used by tests and as the engine of the others
//! - [`FileStore`]: a `MemoryStore` saved to a JSON file after every write
//! - [`HttpStore`]: a client of `nutrilog-server` (REST + WebSocket)
//!
//! # Subscriptions
//!
//! [`RemoteStore::watch`] adapts the backend's push notifications into a
//! stream: the current value is yielded first, then a fresh snapshot each time
//! a write changes the value at the path. Dropping the stream unsubscribes.

mod error;
mod file;
mod http;
mod memory;
mod path;
mod push_id;
pub mod tree;

pub use error::StoreError;
pub use file::FileStore;
pub use http::{HttpStore, MAX_TRANSACTION_ATTEMPTS};
pub use memory::MemoryStore;
pub use path::DbPath;
pub use push_id::PushIdGenerator;
pub use tree::{OrderBy, Query};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Full value at a path at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: DbPath,
    pub value: Option<Value>,
}

impl Snapshot {
    pub fn new(path: DbPath, value: Option<Value>) -> Self {
        Self { path, value }
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        match &self.value {
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
            None => Ok(None),
        }
    }
}

pub type SnapshotStream = BoxStream<'static, Result<Snapshot, StoreError>>;

/// What a transaction update function decided.
#[derive(Debug, Clone, PartialEq)]
pub enum TxAction {
    /// Write this value (`None` deletes).
    Commit(Option<Value>),
    /// Leave the current value alone.
    Abort,
}

/// Result of [`RemoteStore::transaction`].
#[derive(Debug, Clone, PartialEq)]
pub struct TxOutcome {
    pub committed: bool,
    /// Value at the path once the transaction finished.
    pub value: Option<Value>,
    pub attempts: u32,
}

#[async_trait]
pub trait RemoteStore: Send + Sync + fmt::Debug {
    /// Value at `path`, `None` if nothing is stored there.
    async fn get(&self, path: &DbPath) -> Result<Option<Value>, StoreError>;

    /// Children of `path` filtered and ordered by `query`.
    async fn query(
        &self,
        path: &DbPath,
        query: &Query,
    ) -> Result<Vec<(String, Value)>, StoreError>;

    /// Replaces the value at `path`. `null` deletes.
    async fn set(&self, path: &DbPath, value: Value) -> Result<(), StoreError>;

    /// Writes several children of `path` at once. Keys may be relative paths.
    async fn update(&self, path: &DbPath, children: Map<String, Value>) -> Result<(), StoreError>;

    /// Appends `value` under a new, time-ordered key and returns the key.
    async fn push(&self, path: &DbPath, value: Value) -> Result<String, StoreError>;

    async fn remove(&self, path: &DbPath) -> Result<(), StoreError> {
        self.set(path, Value::Null).await
    }

    /// Atomically replaces the value at `path` with the result of `update`.
    ///
    /// `update` receives the current value and may run more than once.
    async fn transaction(
        &self,
        path: &DbPath,
        update: &(dyn Fn(Option<Value>) -> TxAction + Send + Sync),
    ) -> Result<TxOutcome, StoreError>;

    /// Stream of snapshots at `path`, starting with the current value.
    fn watch(&self, path: &DbPath) -> SnapshotStream;

    fn backend_name(&self) -> &'static str;
}

/// Typed helpers over [`RemoteStore`].
#[async_trait]
pub trait StoreExt: RemoteStore {
    async fn get_as<T>(&self, path: &DbPath) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        match self.get(path).await? {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    async fn set_as<T>(&self, path: &DbPath, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.set(path, value).await
    }

    async fn push_as<T>(&self, path: &DbPath, value: &T) -> Result<String, StoreError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.push(path, value).await
    }

    /// Every child of `path` that deserializes as `T`, keyed by child key.
    ///
    /// Children that fail to deserialize are skipped with a warning.
    async fn children_as<T>(&self, path: &DbPath) -> Result<Vec<(String, T)>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let children = match self.get(path).await? {
            Some(Value::Object(map)) => map.into_iter().collect(),
            _ => Vec::new(),
        };
        Ok(decode_children(path, children))
    }

    async fn query_as<T>(
        &self,
        path: &DbPath,
        query: &Query,
    ) -> Result<Vec<(String, T)>, StoreError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let children = self.query(path, query).await?;
        Ok(decode_children(path, children))
    }

    /// Typed snapshots at `path`; `None` while nothing is stored.
    fn watch_as<T>(&self, path: &DbPath) -> BoxStream<'static, Result<Option<T>, StoreError>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.watch(path)
            .map(|snapshot| snapshot.and_then(|s| s.deserialize::<T>()))
            .boxed()
    }
}

impl<S: RemoteStore + ?Sized> StoreExt for S {}

fn decode_children<T: DeserializeOwned>(
    path: &DbPath,
    children: Vec<(String, Value)>,
) -> Vec<(String, T)> {
    children
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(item) => Some((key, item)),
            Err(e) => {
                tracing::warn!("Skipping malformed record {}/{}: {}", path, key, e);
                None
            }
        })
        .collect()
}
