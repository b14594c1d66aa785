use chrono::NaiveDate;
use futures::StreamExt;

use super::{require, RepoError, RepoStream, SharedStore};
use crate::models::WaterLog;
use crate::paths;
use crate::store::{StoreExt, TxAction};

#[derive(Debug, Clone)]
pub struct WaterRepository {
    store: SharedStore,
}

impl WaterRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Adds `ml` to the day's total and returns the new total.
    ///
    /// Runs as a store transaction, so concurrent adds are never lost.
    pub async fn add(&self, uid: &str, date: NaiveDate, ml: u32) -> Result<WaterLog, RepoError> {
        require(ml > 0, "amount must be positive")?;
        let path = paths::water_log(uid, date)?;
        let outcome = self
            .store
            .transaction(&path, &|current| {
                let so_far = current
                    .and_then(|v| serde_json::from_value::<WaterLog>(v).ok())
                    .map_or(0, |log| log.amount_ml);
                let log = WaterLog::new(date).with_amount(so_far.saturating_add(ml));
                match serde_json::to_value(log) {
                    Ok(value) => TxAction::Commit(Some(value)),
                    Err(_) => TxAction::Abort,
                }
            })
            .await?;

        tracing::debug!(
            "Water for {} on {}: +{} ml after {} attempt(s)",
            uid,
            date,
            ml,
            outcome.attempts
        );
        match outcome.value {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(WaterLog::new(date)),
        }
    }

    /// The day's log; zero when nothing was recorded.
    pub async fn get(&self, uid: &str, date: NaiveDate) -> Result<WaterLog, RepoError> {
        let log: Option<WaterLog> = self.store.get_as(&paths::water_log(uid, date)?).await?;
        Ok(log.unwrap_or_else(|| WaterLog::new(date)))
    }

    pub async fn reset(&self, uid: &str, date: NaiveDate) -> Result<(), RepoError> {
        Ok(self.store.remove(&paths::water_log(uid, date)?).await?)
    }

    pub fn watch(&self, uid: &str, date: NaiveDate) -> Result<RepoStream<WaterLog>, RepoError> {
        let path = paths::water_log(uid, date)?;
        Ok(self
            .store
            .watch_as::<WaterLog>(&path)
            .map(move |item| {
                item.map(|log| log.unwrap_or_else(|| WaterLog::new(date)))
                    .map_err(RepoError::from)
            })
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    #[tokio::test]
    async fn test_add_accumulates() {
        let repo = WaterRepository::new(Arc::new(MemoryStore::new()));
        assert_eq!(repo.get("u1", day()).await.unwrap().amount_ml, 0);

        repo.add("u1", day(), 250).await.unwrap();
        let log = repo.add("u1", day(), 500).await.unwrap();
        assert_eq!(log.amount_ml, 750);
        assert_eq!(repo.get("u1", day()).await.unwrap(), log);

        repo.reset("u1", day()).await.unwrap();
        assert_eq!(repo.get("u1", day()).await.unwrap().amount_ml, 0);
    }

    #[tokio::test]
    async fn test_add_rejects_zero() {
        let repo = WaterRepository::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            repo.add("u1", day(), 0).await,
            Err(RepoError::Invalid(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_all_persist() {
        let repo = WaterRepository::new(Arc::new(MemoryStore::new()));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.add("u1", day(), 100).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(repo.get("u1", day()).await.unwrap().amount_ml, 1600);
    }

    #[tokio::test]
    async fn test_watch_starts_at_zero() {
        let repo = WaterRepository::new(Arc::new(MemoryStore::new()));
        let mut stream = repo.watch("u1", day()).unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap().amount_ml, 0);

        repo.add("u1", day(), 300).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap().amount_ml, 300);
    }
}
