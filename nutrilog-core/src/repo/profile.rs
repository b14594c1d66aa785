use chrono::Utc;
use futures::StreamExt;
use serde_json::{json, Map};

use super::{require, RepoError, RepoStream, SharedStore};
use crate::models::Profile;
use crate::paths;
use crate::store::StoreExt;

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    store: SharedStore,
}

impl ProfileRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn get(&self, uid: &str) -> Result<Option<Profile>, RepoError> {
        Ok(self.store.get_as(&paths::profile(uid)?).await?)
    }

    pub async fn save(&self, profile: &Profile) -> Result<(), RepoError> {
        validate(profile)?;
        self.store
            .set_as(&paths::profile(&profile.uid)?, profile)
            .await?;
        tracing::debug!("Saved profile {}", profile.uid);
        Ok(())
    }

    /// Records a new body weight and returns the updated profile.
    pub async fn update_weight(&self, uid: &str, weight_kg: f64) -> Result<Profile, RepoError> {
        require(weight_kg > 0.0, "weight must be positive")?;
        let path = paths::profile(uid)?;
        if self.get(uid).await?.is_none() {
            return Err(RepoError::NotFound(format!("Profile {}", uid)));
        }

        let mut changes = Map::new();
        changes.insert("weight_kg".into(), json!(weight_kg));
        changes.insert("updated_at".into(), serde_json::to_value(Utc::now())?);
        self.store.update(&path, changes).await?;

        self.get(uid)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Profile {}", uid)))
    }

    pub async fn delete(&self, uid: &str) -> Result<(), RepoError> {
        Ok(self.store.remove(&paths::profile(uid)?).await?)
    }

    pub fn watch(&self, uid: &str) -> Result<RepoStream<Option<Profile>>, RepoError> {
        let path = paths::profile(uid)?;
        Ok(self
            .store
            .watch_as::<Profile>(&path)
            .map(|item| item.map_err(RepoError::from))
            .boxed())
    }
}

fn validate(profile: &Profile) -> Result<(), RepoError> {
    require(!profile.name.trim().is_empty(), "name is required")?;
    require(profile.age > 0, "age must be positive")?;
    require(profile.height_cm > 0.0, "height must be positive")?;
    require(profile.weight_kg > 0.0, "weight must be positive")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Objective, Sex};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn repo() -> ProfileRepository {
        ProfileRepository::new(Arc::new(MemoryStore::new()))
    }

    fn ana() -> Profile {
        Profile::new("u1", "Ana", Sex::Female, 30, 165.0, 60.0)
            .with_objective(Objective::LoseWeight)
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = repo();
        let profile = ana();
        repo.save(&profile).await.unwrap();

        let fetched = repo.get("u1").await.unwrap().unwrap();
        assert_eq!(fetched, profile);
        assert!(repo.get("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_profile() {
        let repo = repo();
        let mut profile = ana();
        profile.height_cm = 0.0;
        assert!(matches!(
            repo.save(&profile).await,
            Err(RepoError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_update_weight() {
        let repo = repo();
        repo.save(&ana()).await.unwrap();

        let updated = repo.update_weight("u1", 58.5).await.unwrap();
        assert_eq!(updated.weight_kg, 58.5);
        assert_eq!(updated.name, "Ana");

        assert!(matches!(
            repo.update_weight("nobody", 70.0).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_watch_and_delete() {
        let repo = repo();
        repo.save(&ana()).await.unwrap();
        let mut stream = repo.watch("u1").unwrap();
        assert!(stream.next().await.unwrap().unwrap().is_some());

        repo.delete("u1").await.unwrap();
        assert!(stream.next().await.unwrap().unwrap().is_none());
    }
}
