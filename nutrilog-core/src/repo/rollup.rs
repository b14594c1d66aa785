use chrono::NaiveDate;
use futures::StreamExt;

use super::{
    ExerciseRepository, FoodRepository, MealRepository, RepoError, RepoStream, SharedStore,
    WaterRepository,
};
use crate::models::{date_key, DailyRollup};
use crate::paths;
use crate::retry::{retry, RetryPolicy};
use crate::rollup::{self, DayRecords, MissingDays, Period, PeriodAverage};
use crate::store::{Query, StoreExt};

/// Outcome of [`RollupRepository::refresh_range`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RefreshReport {
    pub refreshed: Vec<NaiveDate>,
    /// Days that still failed after every retry, with the last error.
    pub failed: Vec<(NaiveDate, String)>,
}

/// Daily rollups, derived from the day's records or read back once stored.
#[derive(Debug, Clone)]
pub struct RollupRepository {
    store: SharedStore,
    meals: MealRepository,
    exercise: ExerciseRepository,
    foods: FoodRepository,
    water: WaterRepository,
    retry: RetryPolicy,
}

impl RollupRepository {
    pub fn new(store: SharedStore) -> Self {
        Self {
            meals: MealRepository::new(store.clone()),
            exercise: ExerciseRepository::new(store.clone()),
            foods: FoodRepository::new(store.clone()),
            water: WaterRepository::new(store.clone()),
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Derives the rollup for `date` from the meal, exercise and water records.
    pub async fn compute(&self, uid: &str, date: NaiveDate) -> Result<DailyRollup, RepoError> {
        let meals = self.meals.list_for_date(uid, date).await?;
        let exercise = self.exercise.list_for_date(uid, date).await?;

        let foods = self
            .foods
            .resolve(uid, meals.iter().flat_map(|m| m.entries.keys()))
            .await?;
        let exercises = self
            .exercise
            .resolve(exercise.iter().map(|e| &e.exercise_id))
            .await?;
        let water_ml = self.water.get(uid, date).await?.amount_ml;

        let records = DayRecords {
            meals,
            exercise,
            foods,
            exercises,
            water_ml,
        };
        Ok(rollup::compute(date, &records))
    }

    /// Computes the rollup for `date` and stores it.
    pub async fn refresh(&self, uid: &str, date: NaiveDate) -> Result<DailyRollup, RepoError> {
        let rollup = self.compute(uid, date).await?;
        self.store
            .set_as(&paths::rollup(uid, date)?, &rollup)
            .await?;
        Ok(rollup)
    }

    /// Refreshes every day from `from` to `to`, retrying each day on failure.
    pub async fn refresh_range(&self, uid: &str, from: NaiveDate, to: NaiveDate) -> RefreshReport {
        let mut report = RefreshReport::default();
        for date in from.iter_days().take_while(|d| *d <= to) {
            let label = format!("Rollup refresh for {} on {}", uid, date);
            match retry(self.retry, &label, || self.refresh(uid, date)).await {
                Ok(_) => report.refreshed.push(date),
                Err(e) => report.failed.push((date, e.to_string())),
            }
        }
        tracing::info!(
            "Refreshed {} rollup(s) for {}, {} failed",
            report.refreshed.len(),
            uid,
            report.failed.len()
        );
        report
    }

    pub async fn get_stored(
        &self,
        uid: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyRollup>, RepoError> {
        Ok(self.store.get_as(&paths::rollup(uid, date)?).await?)
    }

    /// Stored rollups between `from` and `to` inclusive, oldest first.
    pub async fn range(
        &self,
        uid: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyRollup>, RepoError> {
        let query = Query::by_key()
            .start_at(date_key(from))
            .end_at(date_key(to));
        let rollups = self
            .store
            .query_as::<DailyRollup>(&paths::rollups(uid)?, &query)
            .await?;
        Ok(rollups.into_iter().map(|(_, r)| r).collect())
    }

    /// Period averages over the stored rollups.
    pub async fn aggregate(
        &self,
        uid: &str,
        from: NaiveDate,
        to: NaiveDate,
        period: Period,
        missing: MissingDays,
    ) -> Result<Vec<PeriodAverage>, RepoError> {
        let rollups = self.range(uid, from, to).await?;
        Ok(rollup::aggregate(&rollups, from, to, period, missing))
    }

    pub fn watch(
        &self,
        uid: &str,
        date: NaiveDate,
    ) -> Result<RepoStream<Option<DailyRollup>>, RepoError> {
        let path = paths::rollup(uid, date)?;
        Ok(self
            .store
            .watch_as::<DailyRollup>(&path)
            .map(|item| item.map_err(RepoError::from))
            .boxed())
    }
}
