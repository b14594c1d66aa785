use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Water consumed on one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterLog {
    pub date: NaiveDate,
    #[serde(default)]
    pub amount_ml: u32,
}

impl WaterLog {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, amount_ml: 0 }
    }

    pub fn with_amount(mut self, ml: u32) -> Self {
        self.amount_ml = ml;
        self
    }

    /// Progress toward `goal_ml`, clamped to `0.0..=1.0`.
    pub fn progress(&self, goal_ml: u32) -> f64 {
        if goal_ml == 0 {
            return 1.0;
        }
        (self.amount_ml as f64 / goal_ml as f64).min(1.0)
    }

    pub fn remaining(&self, goal_ml: u32) -> u32 {
        goal_ml.saturating_sub(self.amount_ml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_and_remaining() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let log = WaterLog::new(date).with_amount(500);
        assert_eq!(log.progress(2000), 0.25);
        assert_eq!(log.remaining(2000), 1500);

        let over = log.with_amount(2500);
        assert_eq!(over.progress(2000), 1.0);
        assert_eq!(over.remaining(2000), 0);
    }

    #[test]
    fn test_zero_goal_is_complete() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(WaterLog::new(date).progress(0), 1.0);
    }
}
