use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::nutrition::NutritionFacts;

/// An entry of the shared food database.
///
/// `nutrition` holds the facts for one serving of `serving_size` `serving_unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    /// Lowercased name, used for prefix search ordering.
    #[serde(default)]
    pub search_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    pub serving_size: f64,
    pub serving_unit: String,
    pub nutrition: NutritionFacts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl FoodItem {
    pub fn new(name: impl Into<String>, nutrition: NutritionFacts) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4().to_string(),
            search_name: name.to_lowercase(),
            name,
            brand: None,
            barcode: None,
            serving_size: 100.0,
            serving_unit: "g".to_string(),
            nutrition,
            category: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_serving(mut self, size: f64, unit: impl Into<String>) -> Self {
        self.serving_size = size;
        self.serving_unit = unit.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Nutrition for `quantity` servings.
    pub fn facts_for(&self, quantity: f64) -> NutritionFacts {
        self.nutrition.scaled(quantity)
    }

    /// Recomputes `search_name` from `name`. Call before persisting edits.
    pub fn normalize(&mut self) {
        self.search_name = self.name.to_lowercase();
    }
}

impl fmt::Display for FoodItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(brand) = &self.brand {
            write!(f, " ({})", brand)?;
        }
        write!(
            f,
            " - {} {}: {}",
            self.serving_size, self.serving_unit, self.nutrition
        )
    }
}

/// A food item created by a user, visible only to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFoodItem {
    pub owner: String,
    #[serde(flatten)]
    pub item: FoodItem,
    pub created_at: DateTime<Utc>,
}

impl CustomFoodItem {
    pub fn new(owner: impl Into<String>, item: FoodItem) -> Self {
        Self {
            owner: owner.into(),
            item,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_new_sets_search_name() {
        let food = FoodItem::new("Greek Yogurt", NutritionFacts::new(59.0, 10.0, 3.6, 0.4));
        assert_eq!(food.search_name, "greek yogurt");
        assert_eq!(food.serving_size, 100.0);
        assert_eq!(food.serving_unit, "g");
    }

    #[test]
    fn test_facts_for_quantity() {
        let food = FoodItem::new("Rice", NutritionFacts::new(130.0, 2.7, 28.0, 0.3));
        let facts = food.facts_for(1.5);
        assert!((facts.calories - 195.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_food_flattens_item() {
        let custom = CustomFoodItem::new(
            "u1",
            FoodItem::new("Abuela's flan", NutritionFacts::new(250.0, 6.0, 35.0, 9.0))
                .with_id("flan"),
        );
        let json = serde_json::to_value(&custom).unwrap();
        assert_eq!(json["owner"], "u1");
        assert_eq!(json["id"], "flan");
        assert_eq!(json["nutrition"]["calories"], 250.0);

        let parsed: CustomFoodItem = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.id(), "flan");
    }

    #[test]
    fn test_display() {
        let food = FoodItem::new("Oats", NutritionFacts::new(389.0, 16.9, 66.3, 6.9))
            .with_brand("Quaker")
            .with_serving(40.0, "g");
        let output = format!("{}", food);
        assert!(output.contains("Oats (Quaker)"));
        assert!(output.contains("40 g"));
    }
}
