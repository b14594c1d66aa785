use chrono::NaiveDate;

use super::{require, RepoError, SharedStore};
use crate::models::{date_key, ProgressEntry};
use crate::paths;
use crate::store::{Query, StoreExt};

/// Body measurements, one entry per day.
#[derive(Debug, Clone)]
pub struct ProgressRepository {
    store: SharedStore,
}

impl ProgressRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Stores the entry for its date, replacing any earlier one that day.
    pub async fn record(&self, uid: &str, entry: &ProgressEntry) -> Result<(), RepoError> {
        require(entry.weight_kg > 0.0, "weight must be positive")?;
        if let Some(pct) = entry.body_fat_pct {
            require((0.0..100.0).contains(&pct), "body fat must be between 0 and 100")?;
        }
        if let Some(cm) = entry.waist_cm {
            require(cm > 0.0, "waist must be positive")?;
        }
        self.store
            .set_as(&paths::progress_entry(uid, entry.date)?, entry)
            .await?;
        Ok(())
    }

    pub async fn get(
        &self,
        uid: &str,
        date: NaiveDate,
    ) -> Result<Option<ProgressEntry>, RepoError> {
        Ok(self.store.get_as(&paths::progress_entry(uid, date)?).await?)
    }

    /// Entries between `from` and `to` inclusive, oldest first.
    pub async fn list_range(
        &self,
        uid: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ProgressEntry>, RepoError> {
        let query = Query::by_key()
            .start_at(date_key(from))
            .end_at(date_key(to));
        let entries = self
            .store
            .query_as::<ProgressEntry>(&paths::progress_entries(uid)?, &query)
            .await?;
        Ok(entries.into_iter().map(|(_, e)| e).collect())
    }

    pub async fn delete(&self, uid: &str, date: NaiveDate) -> Result<(), RepoError> {
        Ok(self.store.remove(&paths::progress_entry(uid, date)?).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_record_replaces_same_day() {
        let repo = ProgressRepository::new(Arc::new(MemoryStore::new()));
        repo.record("u1", &ProgressEntry::new(day(1), 70.0)).await.unwrap();
        repo.record("u1", &ProgressEntry::new(day(1), 69.5).with_waist(80.0))
            .await
            .unwrap();

        let entry = repo.get("u1", day(1)).await.unwrap().unwrap();
        assert_eq!(entry.weight_kg, 69.5);
        assert_eq!(entry.waist_cm, Some(80.0));
    }

    #[tokio::test]
    async fn test_list_range_oldest_first() {
        let repo = ProgressRepository::new(Arc::new(MemoryStore::new()));
        for (d, w) in [(20, 68.0), (2, 70.0), (10, 69.0)] {
            repo.record("u1", &ProgressEntry::new(day(d), w)).await.unwrap();
        }

        let weights: Vec<f64> = repo
            .list_range("u1", day(1), day(15))
            .await
            .unwrap()
            .iter()
            .map(|e| e.weight_kg)
            .collect();
        assert_eq!(weights, vec![70.0, 69.0]);

        repo.delete("u1", day(2)).await.unwrap();
        assert_eq!(repo.list_range("u1", day(1), day(31)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_record_validates() {
        let repo = ProgressRepository::new(Arc::new(MemoryStore::new()));
        let bad = ProgressEntry::new(day(1), 70.0).with_body_fat(120.0);
        assert!(matches!(
            repo.record("u1", &bad).await,
            Err(RepoError::Invalid(_))
        ));
    }
}
