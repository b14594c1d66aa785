use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body measurements recorded on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub date: NaiveDate,
    pub weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ProgressEntry {
    pub fn new(date: NaiveDate, weight_kg: f64) -> Self {
        Self {
            date,
            weight_kg,
            body_fat_pct: None,
            waist_cm: None,
            notes: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_body_fat(mut self, pct: f64) -> Self {
        self.body_fat_pct = Some(pct);
        self
    }

    pub fn with_waist(mut self, cm: f64) -> Self {
        self.waist_cm = Some(cm);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl fmt::Display for ProgressEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {:.1} kg", self.date, self.weight_kg)?;
        if let Some(fat) = self.body_fat_pct {
            write!(f, "  {:.1}% fat", fat)?;
        }
        if let Some(waist) = self.waist_cm {
            write!(f, "  waist {:.1} cm", waist)?;
        }
        Ok(())
    }
}
