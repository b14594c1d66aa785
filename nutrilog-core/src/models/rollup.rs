use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::nutrition::NutritionFacts;

/// Nutrition totals for one user on one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRollup {
    pub date: NaiveDate,
    #[serde(default)]
    pub consumed: NutritionFacts,
    #[serde(default)]
    pub burned_calories: f64,
    #[serde(default)]
    pub net_calories: f64,
    #[serde(default)]
    pub water_ml: u32,
}

impl DailyRollup {
    /// A day with nothing recorded.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            consumed: NutritionFacts::default(),
            burned_calories: 0.0,
            net_calories: 0.0,
            water_ml: 0,
        }
    }

    pub fn new(date: NaiveDate, consumed: NutritionFacts, burned_calories: f64) -> Self {
        Self {
            date,
            consumed,
            burned_calories,
            net_calories: consumed.calories - burned_calories,
            water_ml: 0,
        }
    }

    pub fn with_water(mut self, ml: u32) -> Self {
        self.water_ml = ml;
        self
    }

    /// Calories left against `goal` after subtracting net intake.
    pub fn remaining(&self, goal: f64) -> f64 {
        goal - self.net_calories
    }
}

impl fmt::Display for DailyRollup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.date)?;
        writeln!(f, "{}", "-".repeat(10))?;
        writeln!(f, "  Consumed: {}", self.consumed)?;
        writeln!(f, "  Burned:   {:.0} kcal", self.burned_calories)?;
        writeln!(f, "  Net:      {:.0} kcal", self.net_calories)?;
        write!(f, "  Water:    {} ml", self.water_ml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_calories() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let rollup = DailyRollup::new(date, NutritionFacts::new(2100.0, 0.0, 0.0, 0.0), 300.0);
        assert_eq!(rollup.net_calories, 1800.0);
        assert_eq!(rollup.remaining(2000.0), 200.0);
    }
}
