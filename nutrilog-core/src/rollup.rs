//! Daily nutrition rollups and the period averages behind progress charts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::models::{
    DailyRollup, Exercise, ExerciseLog, FoodItem, MealLog, NutritionFacts, ProgressEntry,
};

/// Everything recorded for one user on one day, with the referenced items
/// already looked up.
#[derive(Debug, Default)]
pub struct DayRecords {
    pub meals: Vec<MealLog>,
    pub exercise: Vec<ExerciseLog>,
    /// Food id -> food. Ids missing here contribute nothing.
    pub foods: HashMap<String, FoodItem>,
    /// Exercise id -> exercise. Ids missing here contribute nothing.
    pub exercises: HashMap<String, Exercise>,
    pub water_ml: u32,
}

/// Sums a day's meals and exercise into a rollup.
///
/// consumed = sum of `servings x facts(food)`, burned = sum of
/// `minutes x kcal/min(exercise)`, net = consumed kcal - burned.
pub fn compute(date: NaiveDate, records: &DayRecords) -> DailyRollup {
    let mut consumed = NutritionFacts::default();
    for meal in &records.meals {
        for (food_id, quantity) in &meal.entries {
            match records.foods.get(food_id) {
                Some(food) => consumed += food.facts_for(*quantity),
                None => tracing::debug!("Food {} not found, counting as zero", food_id),
            }
        }
    }

    let burned: f64 = records
        .exercise
        .iter()
        .filter_map(|log| match records.exercises.get(&log.exercise_id) {
            Some(exercise) => Some(exercise.calories_for(log.duration_minutes)),
            None => {
                tracing::debug!("Exercise {} not found, counting as zero", log.exercise_id);
                None
            }
        })
        .sum();

    DailyRollup::new(date, consumed, burned).with_water(records.water_ml)
}

/// Length of an aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// ISO week, Monday to Sunday.
    Week,
    /// Calendar month.
    Month,
}

impl Period {
    fn bucket_of(&self, date: NaiveDate) -> (i32, u32) {
        match self {
            Period::Week => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            Period::Month => (date.year(), date.month()),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" | "weekly" => Ok(Period::Week),
            "month" | "monthly" => Ok(Period::Month),
            _ => Err(format!("Invalid period '{}'. Valid options: week, month", s)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Week => write!(f, "week"),
            Period::Month => write!(f, "month"),
        }
    }
}

/// How days without a stored rollup enter an average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDays {
    /// Count them as zero. Sparse history pulls averages down.
    #[default]
    Zero,
    /// Average over recorded days only.
    Skip,
}

/// Averages of every numeric rollup field over one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAverage {
    pub period: Period,
    /// First day of the bucket inside the requested range.
    pub start: NaiveDate,
    /// Last day of the bucket inside the requested range.
    pub end: NaiveDate,
    pub days_in_range: u32,
    pub days_recorded: u32,
    pub consumed: NutritionFacts,
    pub burned_calories: f64,
    pub net_calories: f64,
    pub water_ml: f64,
}

impl fmt::Display for PeriodAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}: {:.0} kcal in, {:.0} kcal out, {:.0} net, {:.0} ml water ({}/{} days)",
            self.start,
            self.end,
            self.consumed.calories,
            self.burned_calories,
            self.net_calories,
            self.water_ml,
            self.days_recorded,
            self.days_in_range
        )
    }
}

/// Buckets `rollups` between `from` and `to` (inclusive) and averages each
/// bucket. Buckets are returned in date order; rollups outside the range are
/// ignored.
pub fn aggregate(
    rollups: &[DailyRollup],
    from: NaiveDate,
    to: NaiveDate,
    period: Period,
    missing: MissingDays,
) -> Vec<PeriodAverage> {
    let by_date: HashMap<NaiveDate, &DailyRollup> = rollups.iter().map(|r| (r.date, r)).collect();
    let mut averages = Vec::new();
    let mut current: Option<Bucket> = None;

    for date in from.iter_days().take_while(|d| *d <= to) {
        let key = period.bucket_of(date);
        let bucket = match current.take() {
            Some(bucket) if bucket.key == key => bucket,
            Some(done) => {
                averages.push(done.finish(period, missing));
                Bucket::new(key, date)
            }
            None => Bucket::new(key, date),
        };
        current = Some(bucket.add(date, by_date.get(&date).copied()));
    }

    if let Some(bucket) = current {
        averages.push(bucket.finish(period, missing));
    }
    averages
}

struct Bucket {
    key: (i32, u32),
    start: NaiveDate,
    end: NaiveDate,
    days: u32,
    recorded: u32,
    consumed: NutritionFacts,
    burned: f64,
    net: f64,
    water: f64,
}

impl Bucket {
    fn new(key: (i32, u32), start: NaiveDate) -> Self {
        Self {
            key,
            start,
            end: start,
            days: 0,
            recorded: 0,
            consumed: NutritionFacts::default(),
            burned: 0.0,
            net: 0.0,
            water: 0.0,
        }
    }

    fn add(mut self, date: NaiveDate, rollup: Option<&DailyRollup>) -> Self {
        self.end = date;
        self.days += 1;
        if let Some(r) = rollup {
            self.recorded += 1;
            self.consumed += r.consumed;
            self.burned += r.burned_calories;
            self.net += r.net_calories;
            self.water += f64::from(r.water_ml);
        }
        self
    }

    fn finish(self, period: Period, missing: MissingDays) -> PeriodAverage {
        let divisor = match missing {
            MissingDays::Zero => self.days,
            MissingDays::Skip => self.recorded,
        };
        let scale = if divisor == 0 { 0.0 } else { 1.0 / f64::from(divisor) };
        PeriodAverage {
            period,
            start: self.start,
            end: self.end,
            days_in_range: self.days,
            days_recorded: self.recorded,
            consumed: self.consumed.scaled(scale),
            burned_calories: self.burned * scale,
            net_calories: self.net * scale,
            water_ml: self.water * scale,
        }
    }
}

/// Mean body weight per bucket, over recorded entries only.
///
/// Buckets with no entry are left out: a missing weigh-in is not zero kg.
pub fn weight_trend(entries: &[ProgressEntry], period: Period) -> Vec<(NaiveDate, f64)> {
    let mut sorted: Vec<&ProgressEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);

    let mut trend: Vec<(NaiveDate, f64)> = Vec::new();
    let mut current: Option<((i32, u32), NaiveDate, f64, u32)> = None;
    for entry in sorted {
        let key = period.bucket_of(entry.date);
        current = match current {
            Some((k, start, sum, n)) if k == key => Some((k, start, sum + entry.weight_kg, n + 1)),
            Some((_, start, sum, n)) => {
                trend.push((start, sum / f64::from(n)));
                Some((key, entry.date, entry.weight_kg, 1))
            }
            None => Some((key, entry.date, entry.weight_kg, 1)),
        };
    }
    if let Some((_, start, sum, n)) = current {
        trend.push((start, sum / f64::from(n)));
    }
    trend
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MealType;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn rollup(date: NaiveDate, kcal: f64) -> DailyRollup {
        DailyRollup::new(date, NutritionFacts::new(kcal, 0.0, 0.0, 0.0), 0.0)
    }

    #[test]
    fn test_compute_sums_quantities() {
        let oats =
            FoodItem::new("Oats", NutritionFacts::new(150.0, 5.0, 27.0, 3.0)).with_id("oats");
        let milk =
            FoodItem::new("Milk", NutritionFacts::new(100.0, 8.0, 12.0, 2.5)).with_id("milk");
        let run = Exercise::new("Running", 10.0).with_id("run");

        let records = DayRecords {
            meals: vec![
                MealLog::new(day(6), MealType::Breakfast)
                    .with_entry("oats", 2.0)
                    .with_entry("milk", 1.0),
                MealLog::new(day(6), MealType::Snack).with_entry("ghost", 3.0),
            ],
            exercise: vec![ExerciseLog::new(day(6), "run", 30.0)],
            foods: [("oats".to_string(), oats), ("milk".to_string(), milk)].into(),
            exercises: [("run".to_string(), run)].into(),
            water_ml: 750,
        };

        let rollup = compute(day(6), &records);
        assert_eq!(rollup.consumed.calories, 400.0);
        assert_eq!(rollup.consumed.protein, 18.0);
        assert_eq!(rollup.burned_calories, 300.0);
        assert_eq!(rollup.net_calories, 100.0);
        assert_eq!(rollup.water_ml, 750);
    }

    #[test]
    fn test_compute_empty_day() {
        let rollup = compute(day(1), &DayRecords::default());
        assert_eq!(rollup, DailyRollup::empty(day(1)));
    }

    #[test]
    fn test_weekly_average_is_mean() {
        // 2025-01-06 is a Monday.
        let rollups: Vec<DailyRollup> = (6..=12)
            .map(|d| rollup(day(d), f64::from(d) * 100.0))
            .collect();
        let weeks = aggregate(&rollups, day(6), day(12), Period::Week, MissingDays::Zero);

        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].days_in_range, 7);
        assert!((weeks[0].consumed.calories - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_days_count_as_zero_by_default() {
        let rollups = vec![rollup(day(6), 1400.0)];
        let zero = aggregate(&rollups, day(6), day(12), Period::Week, MissingDays::default());
        assert!((zero[0].consumed.calories - 200.0).abs() < 1e-9);
        assert_eq!(zero[0].days_recorded, 1);

        let skip = aggregate(&rollups, day(6), day(12), Period::Week, MissingDays::Skip);
        assert!((skip[0].consumed.calories - 1400.0).abs() < 1e-9);
    }

    #[test]
    fn test_buckets_split_on_iso_week_and_clip_to_range() {
        // Friday 3rd to Wednesday 8th spans two ISO weeks.
        let weeks = aggregate(&[], day(3), day(8), Period::Week, MissingDays::Skip);
        assert_eq!(weeks.len(), 2);
        assert_eq!((weeks[0].start, weeks[0].end), (day(3), day(5)));
        assert_eq!((weeks[1].start, weeks[1].end), (day(6), day(8)));
        assert_eq!(weeks[1].consumed.calories, 0.0);
    }

    #[test]
    fn test_monthly_buckets() {
        let from = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        let rollups = vec![rollup(from, 300.0), rollup(to, 500.0)];
        let months = aggregate(&rollups, from, to, Period::Month, MissingDays::Zero);
        assert_eq!(months.len(), 2);
        assert!((months[0].consumed.calories - 150.0).abs() < 1e-9);
        assert!((months[1].consumed.calories - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_trend_skips_empty_buckets() {
        let entries = vec![
            ProgressEntry::new(day(7), 80.0),
            ProgressEntry::new(day(6), 81.0),
            ProgressEntry::new(day(20), 79.0),
        ];
        let trend = weight_trend(&entries, Period::Week);
        assert_eq!(trend, vec![(day(6), 80.5), (day(20), 79.0)]);
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!(Period::from_str("Weekly").unwrap(), Period::Week);
        assert!(Period::from_str("year").is_err());
    }
}
