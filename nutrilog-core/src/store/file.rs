//! A [`MemoryStore`] persisted to a single JSON file.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::StoreError;
use super::memory::MemoryStore;
use super::path::DbPath;
use super::tree::Query;
use super::{RemoteStore, SnapshotStream, TxAction, TxOutcome};

/// Tree store that rewrites its file after every successful write.
///
/// Writes go through a temp file and a rename, so a crash never leaves a
/// half-written tree behind. A write whose file save fails is rolled back in
/// memory; watchers may briefly see it before the rollback.
#[derive(Debug, Clone)]
pub struct FileStore {
    memory: MemoryStore,
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tree = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
            if content.trim().is_empty() {
                Value::Object(Map::new())
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Value::Object(Map::new())
        };

        tracing::debug!("Opened file store at {}", path.display());

        Ok(Self {
            memory: MemoryStore::from_value(tree),
            path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// The in-memory engine, for callers that need its extra operations.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Conditional write, see [`MemoryStore::compare_and_set`].
    pub async fn compare_and_set(
        &self,
        path: &DbPath,
        expected_etag: &str,
        value: Value,
    ) -> Result<Option<Value>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.memory.snapshot().await;
        let stored = self.memory.compare_and_set(path, expected_etag, value).await?;
        self.persist(before).await?;
        Ok(stored)
    }

    /// Saves the tree, restoring `before` in memory when the save fails.
    ///
    /// Callers hold `write_lock` from taking `before` until this returns.
    async fn persist(&self, before: Value) -> Result<(), StoreError> {
        if let Err(e) = self.save().await {
            tracing::error!(
                "Could not save {}, rolling back: {}",
                self.path.display(),
                e
            );
            self.memory.replace(before).await;
            return Err(e);
        }
        Ok(())
    }

    async fn save(&self) -> Result<(), StoreError> {
        let tree = self.memory.snapshot().await;
        let bytes = serde_json::to_vec_pretty(&tree)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = File::create(&temp_path).map_err(|e| io_error(&temp_path, e))?;
        file.write_all(&bytes)
            .map_err(|e| io_error(&temp_path, e))?;
        file.sync_all().map_err(|e| io_error(&temp_path, e))?;

        fs::rename(&temp_path, &self.path).map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl RemoteStore for FileStore {
    async fn get(&self, path: &DbPath) -> Result<Option<Value>, StoreError> {
        self.memory.get(path).await
    }

    async fn query(
        &self,
        path: &DbPath,
        query: &Query,
    ) -> Result<Vec<(String, Value)>, StoreError> {
        self.memory.query(path, query).await
    }

    async fn set(&self, path: &DbPath, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.memory.snapshot().await;
        self.memory.set(path, value).await?;
        self.persist(before).await
    }

    async fn update(&self, path: &DbPath, children: Map<String, Value>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.memory.snapshot().await;
        self.memory.update(path, children).await?;
        self.persist(before).await
    }

    async fn push(&self, path: &DbPath, value: Value) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.memory.snapshot().await;
        let key = self.memory.push(path, value).await?;
        self.persist(before).await?;
        Ok(key)
    }

    async fn transaction(
        &self,
        path: &DbPath,
        update: &(dyn Fn(Option<Value>) -> TxAction + Send + Sync),
    ) -> Result<TxOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.memory.snapshot().await;
        let outcome = self.memory.transaction(path, update).await?;
        if outcome.committed {
            self.persist(before).await?;
        }
        Ok(outcome)
    }

    fn watch(&self, path: &DbPath) -> SnapshotStream {
        self.memory.watch(path)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
