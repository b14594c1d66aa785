mod date_key;
mod exercise;
mod food;
mod ingredient;
mod meal_log;
mod meal_type;
mod nutrition;
mod profile;
mod progress;
mod recipe;
mod rollup;
mod social;
mod water;

pub use date_key::{date_key, parse_date_key};
pub use exercise::{Exercise, ExerciseLog};
pub use food::{CustomFoodItem, FoodItem};
pub use ingredient::Ingredient;
pub use meal_log::MealLog;
pub use meal_type::MealType;
pub use nutrition::{MacroPercentages, NutritionFacts};
pub use profile::{
    bmi, ActivityLevel, BmiCategory, MacroTargets, Objective, Profile, Sex, DEFAULT_WATER_GOAL_ML,
};
pub use progress::ProgressEntry;
pub use recipe::{Recipe, RecipeSource};
pub use rollup::DailyRollup;
pub use social::{Comment, Post, Team};
pub use water::WaterLog;
