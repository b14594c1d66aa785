use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An exercise from the shared catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub calories_per_minute: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Exercise {
    pub fn new(name: impl Into<String>, calories_per_minute: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            calories_per_minute,
            category: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn calories_for(&self, minutes: f64) -> f64 {
        self.calories_per_minute * minutes
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} kcal/min)", self.name, self.calories_per_minute)
    }
}

/// One exercise session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    #[serde(default)]
    pub id: String,
    pub date: NaiveDate,
    pub exercise_id: String,
    pub duration_minutes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExerciseLog {
    pub fn new(date: NaiveDate, exercise_id: impl Into<String>, duration_minutes: f64) -> Self {
        Self {
            id: String::new(),
            date,
            exercise_id: exercise_id.into(),
            duration_minutes,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calories_for_duration() {
        let run = Exercise::new("Running", 11.5);
        assert!((run.calories_for(30.0) - 345.0).abs() < 1e-9);
    }

    #[test]
    fn test_exercise_log_new() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let log = ExerciseLog::new(date, "running", 45.0).with_notes("park loop");
        assert_eq!(log.exercise_id, "running");
        assert_eq!(log.duration_minutes, 45.0);
        assert_eq!(log.notes.as_deref(), Some("park loop"));
    }
}
