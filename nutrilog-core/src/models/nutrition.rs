use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

/// Kilocalories per gram of protein and carbohydrate.
pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
/// Kilocalories per gram of fat.
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// Nutrition facts for one serving (or one day, once summed).
///
/// Macros are in grams, sodium in milligrams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionFacts {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
}

/// Share of calories coming from each macro, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroPercentages {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl NutritionFacts {
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
            ..Self::default()
        }
    }

    pub fn with_fiber(mut self, fiber: f64) -> Self {
        self.fiber = fiber;
        self
    }

    pub fn with_sugar(mut self, sugar: f64) -> Self {
        self.sugar = sugar;
        self
    }

    pub fn with_sodium(mut self, sodium: f64) -> Self {
        self.sodium = sodium;
        self
    }

    /// Scales every field by `factor` (e.g. the number of servings eaten).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
            fiber: self.fiber * factor,
            sugar: self.sugar * factor,
            sodium: self.sodium * factor,
        }
    }

    /// Percent of macro calories contributed by protein, carbs and fat.
    ///
    /// Returns all zeros when there are no macro calories.
    pub fn macro_percentages(&self) -> MacroPercentages {
        let protein = self.protein * KCAL_PER_GRAM_PROTEIN;
        let carbs = self.carbs * KCAL_PER_GRAM_CARBS;
        let fat = self.fat * KCAL_PER_GRAM_FAT;
        let total = protein + carbs + fat;
        if total <= 0.0 {
            return MacroPercentages::default();
        }
        MacroPercentages {
            protein: protein / total * 100.0,
            carbs: carbs / total * 100.0,
            fat: fat / total * 100.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Add for NutritionFacts {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for NutritionFacts {
    fn add_assign(&mut self, rhs: Self) {
        self.calories += rhs.calories;
        self.protein += rhs.protein;
        self.carbs += rhs.carbs;
        self.fat += rhs.fat;
        self.fiber += rhs.fiber;
        self.sugar += rhs.sugar;
        self.sodium += rhs.sodium;
    }
}

impl Mul<f64> for NutritionFacts {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.scaled(rhs)
    }
}

impl Sum for NutritionFacts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, f| acc + f)
    }
}

impl fmt::Display for NutritionFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0} kcal | P {:.1} g | C {:.1} g | F {:.1} g",
            self.calories, self.protein, self.carbs, self.fat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled() {
        let facts = NutritionFacts::new(100.0, 10.0, 5.0, 2.0).with_sodium(50.0);
        let double = facts.scaled(2.0);
        assert_eq!(double.calories, 200.0);
        assert_eq!(double.protein, 20.0);
        assert_eq!(double.sodium, 100.0);
        assert_eq!(facts * 0.5, facts.scaled(0.5));
    }

    #[test]
    fn test_sum() {
        let total: NutritionFacts = vec![
            NutritionFacts::new(100.0, 1.0, 2.0, 3.0),
            NutritionFacts::new(50.0, 1.0, 1.0, 1.0).with_fiber(4.0),
        ]
        .into_iter()
        .sum();
        assert_eq!(total.calories, 150.0);
        assert_eq!(total.fat, 4.0);
        assert_eq!(total.fiber, 4.0);
    }

    #[test]
    fn test_macro_percentages() {
        // 25 g protein = 100 kcal, 25 g carbs = 100 kcal, 200/9 g fat = 200 kcal
        let facts = NutritionFacts::new(400.0, 25.0, 25.0, 200.0 / 9.0);
        let pct = facts.macro_percentages();
        assert!((pct.protein - 25.0).abs() < 1e-9);
        assert!((pct.carbs - 25.0).abs() < 1e-9);
        assert!((pct.fat - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_macro_percentages_empty() {
        assert_eq!(
            NutritionFacts::default().macro_percentages(),
            MacroPercentages::default()
        );
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let facts: NutritionFacts = serde_json::from_str(r#"{"calories": 52}"#).unwrap();
        assert_eq!(facts.calories, 52.0);
        assert_eq!(facts.protein, 0.0);
    }
}
