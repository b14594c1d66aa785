//! In-process tree store.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};

use super::error::StoreError;
use super::path::DbPath;
use super::push_id::PushIdGenerator;
use super::tree::{self, Query};
use super::{RemoteStore, Snapshot, SnapshotStream, TxAction, TxOutcome};

/// Capacity of the change channel. Watchers that fall further behind re-read.
const CHANGE_BUFFER: usize = 256;

/// A JSON tree held in memory.
///
/// Cloning is cheap and clones share the same tree.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    tree: RwLock<Value>,
    changes: broadcast::Sender<DbPath>,
    ids: PushIdGenerator,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Starts from an existing tree, e.g. one loaded from disk.
    pub fn from_value(value: Value) -> Self {
        let value = match tree::normalize(value) {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            inner: Arc::new(Inner {
                tree: RwLock::new(value),
                changes,
                ids: PushIdGenerator::new(),
            }),
        }
    }

    /// Copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.inner.tree.read().await.clone()
    }

    /// Swaps in a whole tree, notifying every watcher.
    pub async fn replace(&self, value: Value) {
        *self.inner.tree.write().await = value;
        self.notify(&DbPath::root());
    }

    /// Writes `value` only if the current value at `path` hashes to `expected_etag`.
    ///
    /// Returns the stored value on success and
    /// [`StoreError::PreconditionFailed`] when the value changed.
    pub async fn compare_and_set(
        &self,
        path: &DbPath,
        expected_etag: &str,
        value: Value,
    ) -> Result<Option<Value>, StoreError> {
        let stored = {
            let mut tree = self.inner.tree.write().await;
            if tree::etag(tree::get_at(&tree, path)) != expected_etag {
                return Err(StoreError::PreconditionFailed(path.to_string()));
            }
            tree::set_at(&mut tree, path, value);
            tree::get_at(&tree, path).cloned()
        };
        self.notify(path);
        Ok(stored)
    }

    /// Number of live `watch` streams.
    pub fn watcher_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }

    async fn read(&self, path: &DbPath) -> Option<Value> {
        let tree = self.inner.tree.read().await;
        tree::get_at(&tree, path).cloned()
    }

    fn notify(&self, path: &DbPath) {
        // No receivers just means nobody is watching.
        let _ = self.inner.changes.send(path.clone());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, path: &DbPath) -> Result<Option<Value>, StoreError> {
        Ok(self.read(path).await)
    }

    async fn query(
        &self,
        path: &DbPath,
        query: &Query,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        let tree = self.inner.tree.read().await;
        Ok(query.apply(tree::get_at(&tree, path)))
    }

    async fn set(&self, path: &DbPath, value: Value) -> Result<(), StoreError> {
        {
            let mut tree = self.inner.tree.write().await;
            tree::set_at(&mut tree, path, value);
        }
        self.notify(path);
        Ok(())
    }

    async fn update(&self, path: &DbPath, children: Map<String, Value>) -> Result<(), StoreError> {
        let writes = children
            .into_iter()
            .map(|(key, value)| Ok((path.join(&key)?, value)))
            .collect::<Result<Vec<_>, StoreError>>()?;
        {
            let mut tree = self.inner.tree.write().await;
            for (target, value) in writes {
                tree::set_at(&mut tree, &target, value);
            }
        }
        self.notify(path);
        Ok(())
    }

    async fn push(&self, path: &DbPath, value: Value) -> Result<String, StoreError> {
        let key = self.inner.ids.next_id();
        self.set(&path.child(&key)?, value).await?;
        Ok(key)
    }

    async fn transaction(
        &self,
        path: &DbPath,
        update: &(dyn Fn(Option<Value>) -> TxAction + Send + Sync),
    ) -> Result<TxOutcome, StoreError> {
        let outcome = {
            let mut tree = self.inner.tree.write().await;
            let current = tree::get_at(&tree, path).cloned();
            match update(current.clone()) {
                TxAction::Abort => TxOutcome {
                    committed: false,
                    value: current,
                    attempts: 1,
                },
                TxAction::Commit(value) => {
                    tree::set_at(&mut tree, path, value.unwrap_or(Value::Null));
                    TxOutcome {
                        committed: true,
                        value: tree::get_at(&tree, path).cloned(),
                        attempts: 1,
                    }
                }
            }
        };
        if outcome.committed {
            self.notify(path);
        }
        Ok(outcome)
    }

    fn watch(&self, path: &DbPath) -> SnapshotStream {
        // Subscribe before the first read so no write can slip in between.
        let state = WatchState {
            store: self.clone(),
            path: path.clone(),
            changes: self.inner.changes.subscribe(),
            last: None,
        };

        stream::unfold(state, |mut state| async move {
            loop {
                if state.last.is_some() {
                    match state.changes.recv().await {
                        Ok(changed) if !changed.overlaps(&state.path) => continue,
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(
                                "Watcher on {} lagged by {} change(s), re-reading",
                                state.path,
                                skipped
                            );
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }

                let value = state.store.read(&state.path).await;
                if state.last.as_ref() == Some(&value) {
                    continue;
                }
                state.last = Some(value.clone());
                let snapshot = Snapshot::new(state.path.clone(), value);
                return Some((Ok(snapshot), state));
            }
        })
        .boxed()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

struct WatchState {
    store: MemoryStore,
    path: DbPath,
    changes: broadcast::Receiver<DbPath>,
    /// Last value yielded; `None` until the initial snapshot.
    last: Option<Option<Value>>,
}
