use chrono::NaiveDate;
use futures::StreamExt;

use super::{decode_keyed, require, with_keys, RepoError, RepoStream, SharedStore};
use crate::models::{date_key, MealLog};
use crate::paths;
use crate::store::{Query, StoreExt, TxAction};

#[derive(Debug, Clone)]
pub struct MealRepository {
    store: SharedStore,
}

impl MealRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Pushes a new meal log under its date and returns the generated id.
    pub async fn log(&self, uid: &str, meal: &MealLog) -> Result<String, RepoError> {
        validate_entries(meal)?;
        let id = self
            .store
            .push_as(&paths::meal_logs(uid, meal.date)?, meal)
            .await?;
        tracing::debug!("Logged {} for {} on {}: {}", meal.meal_type, uid, meal.date, id);
        Ok(id)
    }

    pub async fn get(
        &self,
        uid: &str,
        date: NaiveDate,
        id: &str,
    ) -> Result<Option<MealLog>, RepoError> {
        let log: Option<MealLog> = self.store.get_as(&paths::meal_log(uid, date, id)?).await?;
        Ok(log.map(|mut log| {
            log.id = id.to_string();
            log
        }))
    }

    /// Meals logged on `date`, in logging order.
    pub async fn list_for_date(
        &self,
        uid: &str,
        date: NaiveDate,
    ) -> Result<Vec<MealLog>, RepoError> {
        let items = self
            .store
            .children_as::<MealLog>(&paths::meal_logs(uid, date)?)
            .await?;
        Ok(sorted(with_keys(items)))
    }

    /// Meals logged between `from` and `to`, inclusive.
    pub async fn list_range(
        &self,
        uid: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MealLog>, RepoError> {
        let query = Query::by_key()
            .start_at(date_key(from))
            .end_at(date_key(to));
        let days = self.store.query(&paths::meal_days(uid)?, &query).await?;
        let meals = days
            .into_iter()
            .flat_map(|(_, day)| decode_keyed::<MealLog>(Some(day)))
            .collect();
        Ok(sorted(meals))
    }

    pub async fn delete(&self, uid: &str, date: NaiveDate, id: &str) -> Result<(), RepoError> {
        Ok(self.store.remove(&paths::meal_log(uid, date, id)?).await?)
    }

    /// Adds servings of a food to an existing log.
    pub async fn add_entry(
        &self,
        uid: &str,
        date: NaiveDate,
        id: &str,
        food_id: &str,
        quantity: f64,
    ) -> Result<MealLog, RepoError> {
        require(quantity > 0.0, "quantity must be positive")?;
        require(!food_id.trim().is_empty(), "food id is required")?;
        self.edit(uid, date, id, |log| log.add_entry(food_id, quantity))
            .await
    }

    /// Removes a food from an existing log. Removing an absent food is a no-op.
    pub async fn remove_entry(
        &self,
        uid: &str,
        date: NaiveDate,
        id: &str,
        food_id: &str,
    ) -> Result<MealLog, RepoError> {
        self.edit(uid, date, id, |log| {
            log.remove_entry(food_id);
        })
        .await
    }

    async fn edit<F>(
        &self,
        uid: &str,
        date: NaiveDate,
        id: &str,
        change: F,
    ) -> Result<MealLog, RepoError>
    where
        F: Fn(&mut MealLog) + Send + Sync,
    {
        let path = paths::meal_log(uid, date, id)?;
        let outcome = self
            .store
            .transaction(&path, &|current| {
                let Some(mut log) = current.and_then(|v| serde_json::from_value::<MealLog>(v).ok())
                else {
                    return TxAction::Abort;
                };
                change(&mut log);
                match serde_json::to_value(&log) {
                    Ok(value) => TxAction::Commit(Some(value)),
                    Err(_) => TxAction::Abort,
                }
            })
            .await?;

        if !outcome.committed {
            return Err(RepoError::NotFound(format!("Meal log {}", id)));
        }
        let mut log: MealLog = match outcome.value {
            Some(value) => serde_json::from_value(value)?,
            None => return Err(RepoError::NotFound(format!("Meal log {}", id))),
        };
        log.id = id.to_string();
        Ok(log)
    }

    /// Live list of the meals logged on `date`.
    pub fn watch_date(
        &self,
        uid: &str,
        date: NaiveDate,
    ) -> Result<RepoStream<Vec<MealLog>>, RepoError> {
        let path = paths::meal_logs(uid, date)?;
        Ok(self
            .store
            .watch(&path)
            .map(|snapshot| {
                snapshot
                    .map(|s| sorted(decode_keyed(s.value)))
                    .map_err(RepoError::from)
            })
            .boxed())
    }
}

fn validate_entries(meal: &MealLog) -> Result<(), RepoError> {
    for (food_id, quantity) in &meal.entries {
        require(!food_id.trim().is_empty(), "food id is required")?;
        require(*quantity > 0.0, format!("quantity for {} must be positive", food_id))?;
    }
    Ok(())
}

fn sorted(mut meals: Vec<MealLog>) -> Vec<MealLog> {
    meals.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
    meals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn repo() -> MealRepository {
        MealRepository::new(Arc::new(MemoryStore::new()))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_log_and_list_for_date() {
        let repo = repo();
        let breakfast = MealLog::new(day(3), MealType::Breakfast).with_entry("oats", 1.0);
        let lunch = MealLog::new(day(3), MealType::Lunch).with_entry("rice", 2.0);
        let id = repo.log("u1", &breakfast).await.unwrap();
        repo.log("u1", &lunch).await.unwrap();
        repo.log("u1", &MealLog::new(day(4), MealType::Dinner)).await.unwrap();

        let meals = repo.list_for_date("u1", day(3)).await.unwrap();
        assert_eq!(meals.len(), 2);
        assert_eq!(meals[0].id, id);
        assert_eq!(meals[0].meal_type, MealType::Breakfast);
        assert_eq!(meals[1].entries["rice"], 2.0);

        let fetched = repo.get("u1", day(3), &id).await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert!(repo.list_for_date("u2", day(3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_rejects_non_positive_quantity() {
        let repo = repo();
        let meal = MealLog::new(day(3), MealType::Snack).with_entry("nuts", 0.0);
        assert!(matches!(
            repo.log("u1", &meal).await,
            Err(RepoError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_list_range_is_inclusive() {
        let repo = repo();
        for d in 1..=5 {
            repo.log("u1", &MealLog::new(day(d), MealType::Lunch))
                .await
                .unwrap();
        }
        let dates: Vec<NaiveDate> = repo
            .list_range("u1", day(2), day(4))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.date)
            .collect();
        assert_eq!(dates, vec![day(2), day(3), day(4)]);
    }

    #[tokio::test]
    async fn test_add_and_remove_entry() {
        let repo = repo();
        let id = repo
            .log("u1", &MealLog::new(day(3), MealType::Dinner).with_entry("pasta", 1.0))
            .await
            .unwrap();

        let log = repo.add_entry("u1", day(3), &id, "pasta", 0.5).await.unwrap();
        assert_eq!(log.entries["pasta"], 1.5);

        let log = repo.add_entry("u1", day(3), &id, "salad", 1.0).await.unwrap();
        assert_eq!(log.entries.len(), 2);

        let log = repo.remove_entry("u1", day(3), &id, "pasta").await.unwrap();
        assert!(!log.entries.contains_key("pasta"));
        assert_eq!(repo.get("u1", day(3), &id).await.unwrap().unwrap(), log);

        assert!(matches!(
            repo.add_entry("u1", day(3), "missing", "pasta", 1.0).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_watch_date() {
        let repo = repo();
        let mut stream = repo.watch_date("u1", day(3)).unwrap();
        assert!(stream.next().await.unwrap().unwrap().is_empty());

        let id = repo
            .log("u1", &MealLog::new(day(3), MealType::Lunch))
            .await
            .unwrap();
        let meals = stream.next().await.unwrap().unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].id, id);

        repo.delete("u1", day(3), &id).await.unwrap();
        assert!(stream.next().await.unwrap().unwrap().is_empty());
    }
}
