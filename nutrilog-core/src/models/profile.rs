use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::nutrition::{KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN};

/// Lowest daily calorie goal the app will ever suggest.
pub const MIN_DAILY_CALORIES: f64 = 1200.0;
/// Calorie offset applied to TDEE for lose/gain objectives.
pub const OBJECTIVE_CALORIE_DELTA: f64 = 500.0;
pub const DEFAULT_WATER_GOAL_ML: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(format!("Invalid sex '{}'. Valid options: male, female", s)),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    /// Multiplier applied to BMR to estimate total daily energy expenditure.
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" => Ok(ActivityLevel::VeryActive),
            _ => Err(format!(
                "Invalid activity level '{}'. Valid options: sedentary, light, moderate, active, very_active",
                s
            )),
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    LoseWeight,
    Maintain,
    GainWeight,
}

impl Objective {
    /// Protein/carbs/fat split as fractions of daily calories.
    pub fn macro_split(&self) -> (f64, f64, f64) {
        match self {
            Objective::LoseWeight => (0.30, 0.40, 0.30),
            Objective::Maintain => (0.20, 0.50, 0.30),
            Objective::GainWeight => (0.25, 0.50, 0.25),
        }
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "lose" | "lose_weight" => Ok(Objective::LoseWeight),
            "maintain" => Ok(Objective::Maintain),
            "gain" | "gain_weight" => Ok(Objective::GainWeight),
            _ => Err(format!(
                "Invalid objective '{}'. Valid options: lose, maintain, gain",
                s
            )),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::LoseWeight => write!(f, "lose_weight"),
            Objective::Maintain => write!(f, "maintain"),
            Objective::GainWeight => write!(f, "gain_weight"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BmiCategory::Underweight => write!(f, "underweight"),
            BmiCategory::Normal => write!(f, "normal"),
            BmiCategory::Overweight => write!(f, "overweight"),
            BmiCategory::Obese => write!(f, "obese"),
        }
    }
}

/// Daily targets derived from a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub uid: String,
    pub name: String,
    pub sex: Sex,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub objective: Objective,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weight_kg: Option<f64>,
    #[serde(default = "default_water_goal")]
    pub water_goal_ml: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_water_goal() -> u32 {
    DEFAULT_WATER_GOAL_ML
}

impl Profile {
    pub fn new(
        uid: impl Into<String>,
        name: impl Into<String>,
        sex: Sex,
        age: u32,
        height_cm: f64,
        weight_kg: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            uid: uid.into(),
            name: name.into(),
            sex,
            age,
            height_cm,
            weight_kg,
            activity_level: ActivityLevel::Sedentary,
            objective: Objective::Maintain,
            target_weight_kg: None,
            water_goal_ml: DEFAULT_WATER_GOAL_ML,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_activity_level(mut self, level: ActivityLevel) -> Self {
        self.activity_level = level;
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_target_weight(mut self, kg: f64) -> Self {
        self.target_weight_kg = Some(kg);
        self
    }

    pub fn with_water_goal(mut self, ml: u32) -> Self {
        self.water_goal_ml = ml;
        self
    }

    /// Body mass index: weight (kg) / height (m)^2. Zero when height is unset.
    pub fn bmi(&self) -> f64 {
        bmi(self.weight_kg, self.height_cm)
    }

    pub fn bmi_category(&self) -> BmiCategory {
        BmiCategory::from_bmi(self.bmi())
    }

    /// Basal metabolic rate (revised Harris-Benedict), kcal/day.
    pub fn bmr(&self) -> f64 {
        let (w, h, a) = (self.weight_kg, self.height_cm, self.age as f64);
        match self.sex {
            Sex::Male => 88.362 + 13.397 * w + 4.799 * h - 5.677 * a,
            Sex::Female => 447.593 + 9.247 * w + 3.098 * h - 4.330 * a,
        }
    }

    /// Total daily energy expenditure.
    pub fn tdee(&self) -> f64 {
        self.bmr() * self.activity_level.factor()
    }

    pub fn daily_calorie_goal(&self) -> f64 {
        let goal = match self.objective {
            Objective::LoseWeight => self.tdee() - OBJECTIVE_CALORIE_DELTA,
            Objective::Maintain => self.tdee(),
            Objective::GainWeight => self.tdee() + OBJECTIVE_CALORIE_DELTA,
        };
        goal.max(MIN_DAILY_CALORIES)
    }

    pub fn macro_targets(&self) -> MacroTargets {
        let calories = self.daily_calorie_goal();
        let (protein, carbs, fat) = self.objective.macro_split();
        MacroTargets {
            calories,
            protein_g: calories * protein / KCAL_PER_GRAM_PROTEIN,
            carbs_g: calories * carbs / KCAL_PER_GRAM_CARBS,
            fat_g: calories * fat / KCAL_PER_GRAM_FAT,
        }
    }
}

/// BMI from weight in kilograms and height in centimetres.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    if height_m <= 0.0 {
        return 0.0;
    }
    weight_kg / (height_m * height_m)
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "Sex: {}", self.sex)?;
        writeln!(f, "Age: {}", self.age)?;
        writeln!(f, "Height: {:.1} cm", self.height_cm)?;
        writeln!(f, "Weight: {:.1} kg", self.weight_kg)?;
        if let Some(target) = self.target_weight_kg {
            writeln!(f, "Target weight: {:.1} kg", target)?;
        }
        writeln!(f, "Activity: {}", self.activity_level)?;
        writeln!(f, "Objective: {}", self.objective)?;
        writeln!(f, "BMI: {:.2} ({})", self.bmi(), self.bmi_category())?;
        writeln!(f, "BMR: {:.0} kcal", self.bmr())?;
        writeln!(f, "Daily goal: {:.0} kcal", self.daily_calorie_goal())?;
        writeln!(f, "Water goal: {} ml", self.water_goal_ml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Profile {
        Profile::new("u1", "Ana", Sex::Female, 30, 175.0, 70.0)
    }

    #[test]
    fn test_bmi_known_value() {
        let profile = sample();
        assert!((profile.bmi() - 22.857).abs() < 0.001);
        assert_eq!(profile.bmi_category(), BmiCategory::Normal);
    }

    #[test]
    fn test_bmi_zero_height() {
        assert_eq!(bmi(70.0, 0.0), 0.0);
    }

    #[test]
    fn test_bmi_categories() {
        assert_eq!(BmiCategory::from_bmi(17.0), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_bmr_female() {
        let profile = sample();
        let expected = 447.593 + 9.247 * 70.0 + 3.098 * 175.0 - 4.330 * 30.0;
        assert!((profile.bmr() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_bmr_male() {
        let profile = Profile::new("u2", "Luis", Sex::Male, 25, 180.0, 80.0);
        let expected = 88.362 + 13.397 * 80.0 + 4.799 * 180.0 - 5.677 * 25.0;
        assert!((profile.bmr() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_calorie_goal_by_objective() {
        let base = sample().with_activity_level(ActivityLevel::Moderate);
        let tdee = base.tdee();
        assert!((base.daily_calorie_goal() - tdee).abs() < 1e-9);

        let lose = base.clone().with_objective(Objective::LoseWeight);
        assert!((lose.daily_calorie_goal() - (tdee - 500.0)).abs() < 1e-9);

        let gain = base.with_objective(Objective::GainWeight);
        assert!((gain.daily_calorie_goal() - (tdee + 500.0)).abs() < 1e-9);
    }

    #[test]
    fn test_calorie_goal_floor() {
        let tiny = Profile::new("u3", "Tiny", Sex::Female, 80, 140.0, 35.0)
            .with_objective(Objective::LoseWeight);
        assert_eq!(tiny.daily_calorie_goal(), MIN_DAILY_CALORIES);
    }

    #[test]
    fn test_macro_targets_sum_to_goal() {
        let profile = sample().with_objective(Objective::LoseWeight);
        let targets = profile.macro_targets();
        let kcal = targets.protein_g * 4.0 + targets.carbs_g * 4.0 + targets.fat_g * 9.0;
        assert!((kcal - targets.calories).abs() < 1e-6);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("F".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!(
            "very-active".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::VeryActive
        );
        assert_eq!("lose".parse::<Objective>().unwrap(), Objective::LoseWeight);
        assert!("couch".parse::<ActivityLevel>().is_err());
    }

    #[test]
    fn test_water_goal_defaults_when_missing() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json.as_object_mut().unwrap().remove("water_goal_ml");
        let parsed: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.water_goal_ml, DEFAULT_WATER_GOAL_ML);
    }
}
