use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::meal_type::MealType;

/// What a user actually ate in one meal.
///
/// `entries` maps a food item id to the number of servings eaten. The ids are
/// not checked against the food database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealLog {
    /// Store key; assigned by the store on push.
    #[serde(default)]
    pub id: String,
    pub date: NaiveDate,
    pub meal_type: MealType,
    #[serde(default)]
    pub entries: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MealLog {
    pub fn new(date: NaiveDate, meal_type: MealType) -> Self {
        Self {
            id: String::new(),
            date,
            meal_type,
            entries: BTreeMap::new(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Adds `quantity` servings of a food, accumulating on repeats.
    pub fn with_entry(mut self, food_id: impl Into<String>, quantity: f64) -> Self {
        self.add_entry(food_id, quantity);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn add_entry(&mut self, food_id: impl Into<String>, quantity: f64) {
        *self.entries.entry(food_id.into()).or_insert(0.0) += quantity;
    }

    pub fn remove_entry(&mut self, food_id: &str) -> Option<f64> {
        self.entries.remove(food_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for MealLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Meal Log: {} - {}", self.date, self.meal_type)?;
        writeln!(f, "{}", "=".repeat(30))?;

        if !self.entries.is_empty() {
            writeln!(f, "Entries:")?;
            for (food_id, quantity) in &self.entries {
                writeln!(f, "  - {} x{}", food_id, quantity)?;
            }
        }

        if let Some(notes) = &self.notes {
            writeln!(f, "\nNotes: {}", notes)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_log_new() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let log = MealLog::new(date, MealType::Dinner);

        assert_eq!(log.date, date);
        assert_eq!(log.meal_type, MealType::Dinner);
        assert!(log.is_empty());
        assert!(log.notes.is_none());
    }

    #[test]
    fn test_entries_accumulate() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut log = MealLog::new(date, MealType::Lunch)
            .with_entry("rice", 1.0)
            .with_entry("rice", 0.5)
            .with_entry("beans", 2.0);

        assert_eq!(log.entries["rice"], 1.5);
        assert_eq!(log.remove_entry("beans"), Some(2.0));
        assert_eq!(log.entries.len(), 1);
    }

    #[test]
    fn test_meal_log_display() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let log = MealLog::new(date, MealType::Dinner)
            .with_entry("soup", 1.0)
            .with_notes("Delicious!");

        let output = format!("{}", log);
        assert!(output.contains("2025-01-01"));
        assert!(output.contains("dinner"));
        assert!(output.contains("soup x1"));
        assert!(output.contains("Delicious!"));
    }
}
