use chrono::NaiveDate;

use super::capture;
use crate::models::{Profile, ProgressEntry};
use crate::repo::{
    ProfileRepository, ProgressRepository, RepoError, RollupRepository, SharedStore,
};
use crate::rollup::{self, MissingDays, Period, PeriodAverage};

/// Progress charts: weigh-ins and intake averages over a date range.
#[derive(Debug)]
pub struct ProgressState {
    pub uid: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub period: Period,
    pub missing: MissingDays,
    pub profile: Option<Profile>,
    pub entries: Vec<ProgressEntry>,
    pub weight_trend: Vec<(NaiveDate, f64)>,
    pub averages: Vec<PeriodAverage>,
    pub error: Option<String>,
    progress: ProgressRepository,
    profiles: ProfileRepository,
    rollups: RollupRepository,
}

struct ProgressData {
    profile: Option<Profile>,
    entries: Vec<ProgressEntry>,
    averages: Vec<PeriodAverage>,
}

impl ProgressState {
    pub fn new(store: SharedStore, uid: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            uid: uid.into(),
            from,
            to,
            period: Period::Week,
            missing: MissingDays::default(),
            profile: None,
            entries: Vec::new(),
            weight_trend: Vec::new(),
            averages: Vec::new(),
            error: None,
            progress: ProgressRepository::new(store.clone()),
            profiles: ProfileRepository::new(store.clone()),
            rollups: RollupRepository::new(store),
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn with_missing_days(mut self, missing: MissingDays) -> Self {
        self.missing = missing;
        self
    }

    pub async fn load(&mut self) {
        let result = self.fetch().await;
        if let Some(data) = capture(&mut self.error, result) {
            self.weight_trend = rollup::weight_trend(&data.entries, self.period);
            self.profile = data.profile;
            self.entries = data.entries;
            self.averages = data.averages;
        }
    }

    pub async fn set_range(&mut self, from: NaiveDate, to: NaiveDate) {
        self.from = from;
        self.to = to;
        self.load().await;
    }

    pub async fn set_period(&mut self, period: Period) {
        self.period = period;
        self.load().await;
    }

    /// Records a weigh-in. The newest weigh-in also becomes the profile weight.
    pub async fn record(&mut self, entry: &ProgressEntry) {
        let result = self.save(entry).await;
        if capture(&mut self.error, result).is_some() {
            self.load().await;
        }
    }

    pub async fn delete(&mut self, date: NaiveDate) {
        let result = self.progress.delete(&self.uid, date).await;
        if capture(&mut self.error, result).is_some() {
            self.load().await;
        }
    }

    pub fn bmi(&self) -> Option<f64> {
        self.profile.as_ref().map(Profile::bmi)
    }

    /// Weight change between the first and last entry in range.
    pub fn weight_change(&self) -> Option<f64> {
        let first = self.entries.first()?;
        let last = self.entries.last()?;
        Some(last.weight_kg - first.weight_kg)
    }

    async fn save(&self, entry: &ProgressEntry) -> Result<(), RepoError> {
        self.progress.record(&self.uid, entry).await?;
        let newest = self.entries.iter().all(|e| e.date <= entry.date);
        if newest && self.profiles.get(&self.uid).await?.is_some() {
            self.profiles
                .update_weight(&self.uid, entry.weight_kg)
                .await?;
        }
        Ok(())
    }

    async fn fetch(&self) -> Result<ProgressData, RepoError> {
        Ok(ProgressData {
            profile: self.profiles.get(&self.uid).await?,
            entries: self
                .progress
                .list_range(&self.uid, self.from, self.to)
                .await?,
            averages: self
                .rollups
                .aggregate(&self.uid, self.from, self.to, self.period, self.missing)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_record_updates_trend_and_profile() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        ProfileRepository::new(store.clone())
            .save(&Profile::new("u1", "Ana", Sex::Female, 30, 175.0, 72.0))
            .await
            .unwrap();

        let mut state = ProgressState::new(store, "u1", day(3), day(16));
        state.load().await;
        assert_eq!(state.averages.len(), 2);

        state.record(&ProgressEntry::new(day(3), 71.0)).await;
        state.record(&ProgressEntry::new(day(5), 70.0)).await;
        state.record(&ProgressEntry::new(day(12), 69.0)).await;

        assert!(state.error.is_none());
        assert_eq!(state.entries.len(), 3);
        assert_eq!(state.weight_trend, vec![(day(3), 70.5), (day(12), 69.0)]);
        assert_eq!(state.weight_change(), Some(-2.0));
        assert_eq!(state.profile.as_ref().unwrap().weight_kg, 69.0);

        // An older weigh-in does not overwrite the current weight.
        state.record(&ProgressEntry::new(day(4), 71.5)).await;
        assert_eq!(state.profile.as_ref().unwrap().weight_kg, 69.0);
    }

    #[tokio::test]
    async fn test_monthly_period_and_errors() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let mut state = ProgressState::new(store, "u1", day(1), day(31)).with_period(Period::Month);
        state.load().await;
        assert_eq!(state.averages.len(), 1);
        assert_eq!(state.averages[0].days_in_range, 31);
        assert!(state.bmi().is_none());

        state.record(&ProgressEntry::new(day(2), -1.0)).await;
        assert!(state.error.is_some());
        assert!(state.entries.is_empty());
    }
}
