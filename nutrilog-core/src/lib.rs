//! Nutrilog Core Library
//!
//! Models, the remote store and its backends, typed repositories, nutrition
//! arithmetic and the headless screen state shared by the nutrilog binaries.

pub mod llm;
pub mod models;
pub mod openfoodfacts;
pub mod paths;
pub mod recipe_ai;
pub mod repo;
pub mod retry;
pub mod rollup;
pub mod state;
pub mod store;

pub use llm::{FakeProvider, GeminiProvider, LlmError, LlmProvider};
pub use models::{
    CustomFoodItem, DailyRollup, Exercise, ExerciseLog, FoodItem, Ingredient, MealLog, MealType,
    NutritionFacts, Post, Profile, ProgressEntry, Recipe, RecipeSource, Team, WaterLog,
};
pub use openfoodfacts::{OpenFoodFactsClient, OpenFoodFactsError};
pub use repo::{RepoError, SharedStore};
pub use store::{DbPath, FileStore, HttpStore, MemoryStore, RemoteStore, StoreError, StoreExt};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
