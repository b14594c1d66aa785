use chrono::NaiveDate;

use super::capture;
use crate::models::{
    DailyRollup, ExerciseLog, MacroPercentages, MacroTargets, MealLog, Profile,
};
use crate::repo::{
    ExerciseRepository, MealRepository, ProfileRepository, RepoError, RollupRepository,
    SharedStore,
};

/// One day of meals and exercise, with its totals against the user's goals.
#[derive(Debug)]
pub struct DiaryState {
    pub uid: String,
    pub date: NaiveDate,
    pub profile: Option<Profile>,
    pub meals: Vec<MealLog>,
    pub exercise: Vec<ExerciseLog>,
    pub rollup: DailyRollup,
    pub error: Option<String>,
    meal_repo: MealRepository,
    exercise_repo: ExerciseRepository,
    profile_repo: ProfileRepository,
    rollup_repo: RollupRepository,
}

struct DiaryData {
    profile: Option<Profile>,
    meals: Vec<MealLog>,
    exercise: Vec<ExerciseLog>,
    rollup: DailyRollup,
}

impl DiaryState {
    pub fn new(store: SharedStore, uid: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            uid: uid.into(),
            date,
            profile: None,
            meals: Vec::new(),
            exercise: Vec::new(),
            rollup: DailyRollup::empty(date),
            error: None,
            meal_repo: MealRepository::new(store.clone()),
            exercise_repo: ExerciseRepository::new(store.clone()),
            profile_repo: ProfileRepository::new(store.clone()),
            rollup_repo: RollupRepository::new(store),
        }
    }

    pub async fn load(&mut self) {
        let result = self.fetch().await;
        if let Some(data) = capture(&mut self.error, result) {
            self.profile = data.profile;
            self.meals = data.meals;
            self.exercise = data.exercise;
            self.rollup = data.rollup;
        }
    }

    pub async fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
        self.meals.clear();
        self.exercise.clear();
        self.rollup = DailyRollup::empty(date);
        self.load().await;
    }

    /// Logs a meal and returns its id.
    pub async fn log_meal(&mut self, meal: &MealLog) -> Option<String> {
        let result = self.meal_repo.log(&self.uid, meal).await;
        let id = capture(&mut self.error, result)?;
        self.changed(meal.date).await;
        Some(id)
    }

    pub async fn add_entry(&mut self, meal_id: &str, food_id: &str, servings: f64) {
        let result = self
            .meal_repo
            .add_entry(&self.uid, self.date, meal_id, food_id, servings)
            .await;
        if capture(&mut self.error, result).is_some() {
            self.changed(self.date).await;
        }
    }

    pub async fn remove_entry(&mut self, meal_id: &str, food_id: &str) {
        let result = self
            .meal_repo
            .remove_entry(&self.uid, self.date, meal_id, food_id)
            .await;
        if capture(&mut self.error, result).is_some() {
            self.changed(self.date).await;
        }
    }

    pub async fn delete_meal(&mut self, meal_id: &str) {
        let result = self.meal_repo.delete(&self.uid, self.date, meal_id).await;
        if capture(&mut self.error, result).is_some() {
            self.changed(self.date).await;
        }
    }

    pub async fn log_exercise(&mut self, entry: &ExerciseLog) -> Option<String> {
        let result = self.exercise_repo.log(&self.uid, entry).await;
        let id = capture(&mut self.error, result)?;
        self.changed(entry.date).await;
        Some(id)
    }

    pub async fn delete_exercise(&mut self, log_id: &str) {
        let result = self.exercise_repo.delete(&self.uid, self.date, log_id).await;
        if capture(&mut self.error, result).is_some() {
            self.changed(self.date).await;
        }
    }

    pub fn calorie_goal(&self) -> Option<f64> {
        self.profile.as_ref().map(Profile::daily_calorie_goal)
    }

    /// Calories left today: goal - consumed + burned.
    pub fn remaining_calories(&self) -> Option<f64> {
        self.calorie_goal().map(|goal| self.rollup.remaining(goal))
    }

    pub fn macro_targets(&self) -> Option<MacroTargets> {
        self.profile.as_ref().map(Profile::macro_targets)
    }

    pub fn macro_percentages(&self) -> MacroPercentages {
        self.rollup.consumed.macro_percentages()
    }

    /// Stores the new rollup for `date` and reloads if it is the day shown.
    async fn changed(&mut self, date: NaiveDate) {
        let result = self.rollup_repo.refresh(&self.uid, date).await;
        if capture(&mut self.error, result).is_some() && date == self.date {
            self.load().await;
        }
    }

    async fn fetch(&self) -> Result<DiaryData, RepoError> {
        Ok(DiaryData {
            profile: self.profile_repo.get(&self.uid).await?,
            meals: self.meal_repo.list_for_date(&self.uid, self.date).await?,
            exercise: self.exercise_repo.list_for_date(&self.uid, self.date).await?,
            rollup: self.rollup_repo.compute(&self.uid, self.date).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exercise, FoodItem, MealType, NutritionFacts, Sex};
    use crate::repo::FoodRepository;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    async fn seeded() -> (SharedStore, DiaryState) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        FoodRepository::new(store.clone())
            .save(
                &FoodItem::new("Rice", NutritionFacts::new(200.0, 4.0, 44.0, 0.5)).with_id("rice"),
            )
            .await
            .unwrap();
        ExerciseRepository::new(store.clone())
            .save_exercise(&Exercise::new("Walking", 4.0).with_id("walk"))
            .await
            .unwrap();
        ProfileRepository::new(store.clone())
            .save(&Profile::new("u1", "Ana", Sex::Female, 30, 165.0, 60.0))
            .await
            .unwrap();
        let state = DiaryState::new(store.clone(), "u1", day());
        (store, state)
    }

    #[tokio::test]
    async fn test_log_meal_updates_totals_and_stored_rollup() {
        let (store, mut state) = seeded().await;
        state.load().await;
        assert!(state.meals.is_empty());
        let goal = state.calorie_goal().unwrap();

        let id = state
            .log_meal(&MealLog::new(day(), MealType::Lunch).with_entry("rice", 2.0))
            .await
            .unwrap();
        state
            .log_exercise(&ExerciseLog::new(day(), "walk", 25.0))
            .await
            .unwrap();

        assert!(state.error.is_none());
        assert_eq!(state.meals[0].id, id);
        assert_eq!(state.rollup.consumed.calories, 400.0);
        assert_eq!(state.rollup.burned_calories, 100.0);
        assert_eq!(state.remaining_calories(), Some(goal - 300.0));

        let stored = RollupRepository::new(store)
            .get_stored("u1", day())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.net_calories, 300.0);

        state.delete_meal(&id).await;
        assert!(state.meals.is_empty());
        assert_eq!(state.rollup.consumed.calories, 0.0);
    }

    #[tokio::test]
    async fn test_entry_edits() {
        let (_, mut state) = seeded().await;
        let id = state
            .log_meal(&MealLog::new(day(), MealType::Dinner).with_entry("rice", 1.0))
            .await
            .unwrap();

        state.add_entry(&id, "rice", 0.5).await;
        assert_eq!(state.rollup.consumed.calories, 300.0);

        state.remove_entry(&id, "rice").await;
        assert_eq!(state.rollup.consumed.calories, 0.0);
        assert!(state.meals[0].entries.is_empty());
    }

    #[tokio::test]
    async fn test_errors_are_captured() {
        let (_, mut state) = seeded().await;
        state.load().await;

        let bad = MealLog::new(day(), MealType::Snack).with_entry("rice", -1.0);
        assert!(state.log_meal(&bad).await.is_none());
        assert!(state.error.as_deref().unwrap().contains("quantity"));

        state.add_entry("missing", "rice", 1.0).await;
        assert_eq!(state.error.as_deref(), Some("Meal log missing not found"));

        state.load().await;
        assert!(state.error.is_none());
    }
}
