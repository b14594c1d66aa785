use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ingredient::Ingredient;
use super::nutrition::NutritionFacts;

/// Where a recipe came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeSource {
    /// Found in the recipe catalog.
    Searched,
    /// Produced by the generative-text service.
    Generated,
    /// Entered by hand.
    Manual,
}

impl fmt::Display for RecipeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeSource::Searched => write!(f, "searched"),
            RecipeSource::Generated => write!(f, "generated"),
            RecipeSource::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub search_title: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub nutrition_per_serving: NutritionFacts,
    pub source: RecipeSource,
    /// ISO 639-1 code of the text fields.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn default_servings() -> u32 {
    1
}

fn default_language() -> String {
    "en".to_string()
}

impl Recipe {
    pub fn new(title: impl Into<String>, source: RecipeSource) -> Self {
        let title = title.into();
        Self {
            id: Uuid::new_v4().to_string(),
            search_title: title.to_lowercase(),
            title,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            servings: 1,
            nutrition_per_serving: NutritionFacts::default(),
            source,
            language: default_language(),
            tags: Vec::new(),
            source_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_instructions(mut self, steps: Vec<String>) -> Self {
        self.instructions = steps;
        self
    }

    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = servings.max(1);
        self
    }

    pub fn with_nutrition(mut self, facts: NutritionFacts) -> Self {
        self.nutrition_per_serving = facts;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn total_nutrition(&self) -> NutritionFacts {
        self.nutrition_per_serving.scaled(self.servings as f64)
    }

    pub fn normalize(&mut self) {
        self.search_title = self.title.to_lowercase();
    }

    /// Case-insensitive match against title, tags and ingredient names.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
            || self
                .ingredients
                .iter()
                .any(|i| i.name.to_lowercase().contains(&term))
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.chars().count()))?;
        writeln!(f, "Servings: {} ({})", self.servings, self.source)?;
        if !self.tags.is_empty() {
            writeln!(f, "Tags: {}", self.tags.join(", "))?;
        }

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !self.instructions.is_empty() {
            writeln!(f, "\nInstructions:")?;
            for (i, step) in self.instructions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, step)?;
            }
        }

        if !self.nutrition_per_serving.is_empty() {
            writeln!(f, "\nNutrition (per serving): {}", self.nutrition_per_serving)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Recipe {
        Recipe::new("Chicken Salad", RecipeSource::Manual)
            .with_ingredients(vec![
                Ingredient::new("chicken breast", 200.0, "g"),
                Ingredient::new("lettuce", 1.0, "head"),
            ])
            .with_instructions(vec!["Grill the chicken.".into(), "Toss.".into()])
            .with_servings(2)
            .with_nutrition(NutritionFacts::new(320.0, 35.0, 8.0, 15.0))
            .with_tags(vec!["high-protein".into()])
    }

    #[test]
    fn test_total_nutrition() {
        assert_eq!(sample().total_nutrition().calories, 640.0);
    }

    #[test]
    fn test_servings_never_zero() {
        assert_eq!(sample().with_servings(0).servings, 1);
    }

    #[test]
    fn test_matches() {
        let recipe = sample();
        assert!(recipe.matches("salad"));
        assert!(recipe.matches("PROTEIN"));
        assert!(recipe.matches("lettuce"));
        assert!(!recipe.matches("tofu"));
    }

    #[test]
    fn test_display() {
        let output = sample().to_string();
        assert!(output.contains("Chicken Salad"));
        assert!(output.contains("200 g chicken breast"));
        assert!(output.contains("2. Toss."));
    }
}
