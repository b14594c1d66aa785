use chrono::NaiveDate;
use std::collections::HashMap;

use super::{require, with_keys, RepoError, SharedStore};
use crate::models::{Exercise, ExerciseLog};
use crate::paths;
use crate::store::StoreExt;

/// The shared exercise catalog and each user's exercise sessions.
#[derive(Debug, Clone)]
pub struct ExerciseRepository {
    store: SharedStore,
}

impl ExerciseRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn save_exercise(&self, exercise: &Exercise) -> Result<(), RepoError> {
        require(!exercise.name.trim().is_empty(), "exercise name is required")?;
        require(
            exercise.calories_per_minute >= 0.0,
            "calories per minute cannot be negative",
        )?;
        self.store
            .set_as(&paths::exercise(&exercise.id)?, exercise)
            .await?;
        Ok(())
    }

    pub async fn get_exercise(&self, id: &str) -> Result<Option<Exercise>, RepoError> {
        Ok(self.store.get_as(&paths::exercise(id)?).await?)
    }

    pub async fn list_exercises(&self) -> Result<Vec<Exercise>, RepoError> {
        let mut exercises: Vec<Exercise> = self
            .store
            .children_as(&paths::exercises()?)
            .await?
            .into_iter()
            .map(|(_, e)| e)
            .collect();
        exercises.sort_by_key(|e| e.name.to_lowercase());
        Ok(exercises)
    }

    pub async fn log(&self, uid: &str, entry: &ExerciseLog) -> Result<String, RepoError> {
        require(entry.duration_minutes > 0.0, "duration must be positive")?;
        let id = self
            .store
            .push_as(&paths::exercise_logs(uid, entry.date)?, entry)
            .await?;
        Ok(id)
    }

    pub async fn list_for_date(
        &self,
        uid: &str,
        date: NaiveDate,
    ) -> Result<Vec<ExerciseLog>, RepoError> {
        let items = self
            .store
            .children_as::<ExerciseLog>(&paths::exercise_logs(uid, date)?)
            .await?;
        let mut logs = with_keys(items);
        logs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(logs)
    }

    pub async fn delete(&self, uid: &str, date: NaiveDate, id: &str) -> Result<(), RepoError> {
        Ok(self.store.remove(&paths::exercise_log(uid, date, id)?).await?)
    }

    /// Catalog entries for `ids`. Unknown ids are left out.
    pub async fn resolve<'a, I>(&self, ids: I) -> Result<HashMap<String, Exercise>, RepoError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut resolved = HashMap::new();
        for id in ids {
            if resolved.contains_key(id) {
                continue;
            }
            if let Some(exercise) = self.get_exercise(id).await? {
                resolved.insert(id.clone(), exercise);
            }
        }
        Ok(resolved)
    }
}
