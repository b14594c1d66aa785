mod config_cmd;
mod exercise;
mod food;
mod meal;
mod profile;
mod progress;
mod recipe;
mod summary;
mod team;
mod water;

pub use config_cmd::ConfigCommand;
pub use exercise::ExerciseCommand;
pub use food::FoodCommand;
pub use meal::MealCommand;
pub use profile::ProfileCommand;
pub use progress::ProgressCommand;
pub use recipe::RecipeCommand;
pub use summary::SummaryCommand;
pub use team::TeamCommand;
pub use water::WaterCommand;

use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use nutrilog_core::llm::{self, LlmProvider};
use nutrilog_core::repo::FoodRepository;
use nutrilog_core::{FileStore, HttpStore, NutritionFacts, OpenFoodFactsClient, SharedStore};
use std::error::Error;
use std::sync::Arc;

use crate::config::Config;

pub type CommandResult = Result<(), Box<dyn Error>>;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// What every command needs: the store and the loaded configuration.
pub struct Context {
    pub store: SharedStore,
    pub config: Config,
}

impl Context {
    /// Opens the server store when one is configured, otherwise the local file.
    pub fn open(config: Config) -> Result<Self, Box<dyn Error>> {
        let store: SharedStore = match &config.server.server_url {
            Some(url) => {
                tracing::debug!("Using server store at {}", url);
                Arc::new(HttpStore::new(url.as_str(), config.server.api_key.clone()))
            }
            None => {
                let path = config.store_path();
                tracing::debug!("Using local store at {}", path.display());
                Arc::new(FileStore::open(path)?)
            }
        };
        Ok(Self { store, config })
    }

    pub fn uid(&self) -> &str {
        &self.config.user_id.value
    }

    pub fn foods(&self) -> FoodRepository {
        FoodRepository::new(self.store.clone())
            .with_lookup(OpenFoodFactsClient::new(self.config.off_url.value.as_str()))
    }

    pub fn llm(&self) -> Result<Arc<dyn LlmProvider>, Box<dyn Error>> {
        let provider = llm::provider_from_key(self.config.gemini_api_key.as_deref(), None)?;
        Ok(Arc::from(provider))
    }
}

/// Parses `YYYY-MM-DD`, defaulting to today.
pub fn parse_date(date: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
    match date {
        Some(d) => Ok(NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", d))?),
        None => Ok(Local::now().date_naive()),
    }
}

/// Turns the message a state holder captured into a command error.
pub fn state_error(error: &Option<String>) -> CommandResult {
    match error {
        Some(message) => Err(message.clone().into()),
        None => Ok(()),
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_facts(facts: &NutritionFacts) -> String {
    format!(
        "{:.0} kcal, P {:.1}g, C {:.1}g, F {:.1}g",
        facts.calories, facts.protein, facts.carbs, facts.fat
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2024-03-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(parse_date(None).unwrap(), Local::now().date_naive());

        let err = parse_date(Some("03/01/2024")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid date format '03/01/2024'. Use YYYY-MM-DD."
        );
    }

    #[test]
    fn test_state_error() {
        assert!(state_error(&None).is_ok());
        let err = state_error(&Some("Meal log m1 not found".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "Meal log m1 not found");
    }

    #[test]
    fn test_format_facts() {
        let facts = NutritionFacts::new(250.0, 10.0, 30.5, 8.0);
        assert_eq!(format_facts(&facts), "250 kcal, P 10.0g, C 30.5g, F 8.0g");
    }
}
