use chrono::NaiveDate;

use super::capture;
use crate::models::{WaterLog, DEFAULT_WATER_GOAL_ML};
use crate::repo::{
    ProfileRepository, RepoError, RollupRepository, SharedStore, WaterRepository,
};

/// Today's water intake against the profile's goal.
#[derive(Debug)]
pub struct WaterState {
    pub uid: String,
    pub date: NaiveDate,
    pub log: WaterLog,
    pub goal_ml: u32,
    pub error: Option<String>,
    water: WaterRepository,
    profiles: ProfileRepository,
    rollups: RollupRepository,
}

impl WaterState {
    pub fn new(store: SharedStore, uid: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            uid: uid.into(),
            date,
            log: WaterLog::new(date),
            goal_ml: DEFAULT_WATER_GOAL_ML,
            error: None,
            water: WaterRepository::new(store.clone()),
            profiles: ProfileRepository::new(store.clone()),
            rollups: RollupRepository::new(store),
        }
    }

    pub async fn load(&mut self) {
        let result = self.fetch().await;
        if let Some((log, goal)) = capture(&mut self.error, result) {
            self.log = log;
            self.goal_ml = goal;
        }
    }

    pub async fn add(&mut self, ml: u32) {
        let result = self.water.add(&self.uid, self.date, ml).await;
        if let Some(log) = capture(&mut self.error, result) {
            self.log = log;
            self.changed().await;
        }
    }

    pub async fn reset(&mut self) {
        let result = self.water.reset(&self.uid, self.date).await;
        if capture(&mut self.error, result).is_some() {
            self.log = WaterLog::new(self.date);
            self.changed().await;
        }
    }

    /// Stores the day's rollup again so its water total follows the log.
    async fn changed(&mut self) {
        let result = self.rollups.refresh(&self.uid, self.date).await;
        capture(&mut self.error, result);
    }

    pub fn progress(&self) -> f64 {
        self.log.progress(self.goal_ml)
    }

    pub fn remaining_ml(&self) -> u32 {
        self.log.remaining(self.goal_ml)
    }

    async fn fetch(&self) -> Result<(WaterLog, u32), RepoError> {
        let log = self.water.get(&self.uid, self.date).await?;
        let goal = self
            .profiles
            .get(&self.uid)
            .await?
            .map_or(DEFAULT_WATER_GOAL_ML, |p| p.water_goal_ml);
        Ok((log, goal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, Sex};
    use crate::rollup::{MissingDays, Period};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    #[tokio::test]
    async fn test_goal_from_profile() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        ProfileRepository::new(store.clone())
            .save(&Profile::new("u1", "Ana", Sex::Female, 30, 165.0, 60.0).with_water_goal(2500))
            .await
            .unwrap();

        let mut state = WaterState::new(store, "u1", day());
        state.load().await;
        assert_eq!(state.goal_ml, 2500);

        state.add(500).await;
        state.add(750).await;
        assert_eq!(state.log.amount_ml, 1250);
        assert_eq!(state.progress(), 0.5);
        assert_eq!(state.remaining_ml(), 1250);

        state.reset().await;
        assert_eq!(state.log.amount_ml, 0);
    }

    #[tokio::test]
    async fn test_stored_rollup_follows_water() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let rollups = RollupRepository::new(store.clone());
        let mut state = WaterState::new(store, "u1", day());

        state.add(1500).await;
        assert!(state.error.is_none());
        let stored = rollups.get_stored("u1", day()).await.unwrap().unwrap();
        assert_eq!(stored.water_ml, 1500);

        let week = rollups
            .aggregate("u1", day(), day(), Period::Week, MissingDays::Skip)
            .await
            .unwrap();
        assert_eq!(week.len(), 1);
        assert_eq!(week[0].water_ml, 1500.0);

        state.reset().await;
        let stored = rollups.get_stored("u1", day()).await.unwrap().unwrap();
        assert_eq!(stored.water_ml, 0);
    }

    #[tokio::test]
    async fn test_default_goal_and_error() {
        let mut state = WaterState::new(Arc::new(MemoryStore::new()), "u1", day());
        state.load().await;
        assert_eq!(state.goal_ml, DEFAULT_WATER_GOAL_ML);

        state.add(0).await;
        assert!(state.error.is_some());
        assert_eq!(state.log.amount_ml, 0);
    }
}
