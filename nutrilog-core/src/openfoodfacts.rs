//! Barcode lookups against the Open Food Facts product API.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::{FoodItem, NutritionFacts};

pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

#[derive(Debug, Error)]
pub enum OpenFoodFactsError {
    #[error("Invalid barcode '{0}': expected digits only")]
    InvalidBarcode(String),

    #[error("Open Food Facts request failed: {0}")]
    RequestFailed(String),

    #[error("Open Food Facts returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse Open Food Facts response: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    categories: Option<String>,
    /// Grams per serving; sent as a number or a numeric string.
    #[serde(default)]
    serving_quantity: Option<Value>,
    #[serde(default)]
    nutriments: HashMap<String, Value>,
}

impl OpenFoodFactsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Looks up a product. `Ok(None)` means the barcode is unknown.
    pub async fn lookup(&self, barcode: &str) -> Result<Option<FoodItem>, OpenFoodFactsError> {
        if barcode.is_empty() || !barcode.chars().all(|c| c.is_ascii_digit()) {
            return Err(OpenFoodFactsError::InvalidBarcode(barcode.to_string()));
        }

        let url = format!("{}/api/v0/product/{}.json", self.base_url, barcode);
        tracing::debug!("Looking up barcode {} at {}", barcode, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OpenFoodFactsError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| OpenFoodFactsError::RequestFailed(e.to_string()))?;

        if status == 404 {
            return Ok(None);
        }
        if status != 200 {
            return Err(OpenFoodFactsError::ApiError {
                status,
                message: body,
            });
        }

        let parsed: ProductResponse = serde_json::from_str(&body)
            .map_err(|e| OpenFoodFactsError::ParseError(e.to_string()))?;

        match (parsed.status, parsed.product) {
            (1, Some(product)) => Ok(Some(product.into_food(barcode))),
            _ => Ok(None),
        }
    }
}

impl Default for OpenFoodFactsClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Product {
    fn nutriment(&self, name: &str) -> f64 {
        number(self.nutriments.get(&format!("{}_100g", name))).unwrap_or(0.0)
    }

    /// Facts per serving when the serving size is known, otherwise per 100 g.
    fn into_food(self, barcode: &str) -> FoodItem {
        let per_100g = NutritionFacts::new(
            self.nutriment("energy-kcal"),
            self.nutriment("proteins"),
            self.nutriment("carbohydrates"),
            self.nutriment("fat"),
        )
        .with_fiber(self.nutriment("fiber"))
        .with_sugar(self.nutriment("sugars"))
        // grams to milligrams
        .with_sodium(self.nutriment("sodium") * 1000.0);

        let serving_g = number(self.serving_quantity.as_ref()).filter(|q| *q > 0.0);
        let (serving_size, facts) = match serving_g {
            Some(grams) => (grams, per_100g.scaled(grams / 100.0)),
            None => (100.0, per_100g),
        };

        let name = self
            .product_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Product {}", barcode));

        let mut food = FoodItem::new(name, facts)
            .with_id(barcode)
            .with_barcode(barcode)
            .with_serving(serving_size, "g");
        if let Some(brand) = first_entry(self.brands.as_deref()) {
            food = food.with_brand(brand);
        }
        if let Some(category) = first_entry(self.categories.as_deref()) {
            food = food.with_category(category);
        }
        food
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First item of a comma-separated list.
fn first_entry(list: Option<&str>) -> Option<&str> {
    list?.split(',').map(str::trim).find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    async fn product(Path(file): Path<String>) -> Result<Json<Value>, StatusCode> {
        match file.as_str() {
            "3017620422003.json" => Ok(Json(json!({
                "status": 1,
                "code": "3017620422003",
                "product": {
                    "product_name": "Nutella",
                    "brands": "Ferrero, Nutella",
                    "categories": "Spreads, Sweet spreads",
                    "serving_quantity": "15",
                    "nutriments": {
                        "energy-kcal_100g": 539,
                        "proteins_100g": 6.3,
                        "carbohydrates_100g": 57.5,
                        "fat_100g": 30.9,
                        "sugars_100g": 56.3,
                        "sodium_100g": 0.0428
                    }
                }
            }))),
            "1111.json" => Ok(Json(json!({
                "status": 1,
                "product": {"nutriments": {"energy-kcal_100g": "100"}}
            }))),
            "500.json" => Err(StatusCode::INTERNAL_SERVER_ERROR),
            _ => Ok(Json(json!({"status": 0, "status_verbose": "product not found"}))),
        }
    }

    async fn spawn_stub() -> String {
        let app = Router::new().route("/api/v0/product/{file}", get(product));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_lookup_scales_to_serving() {
        let client = OpenFoodFactsClient::new(spawn_stub().await);
        let food = client.lookup("3017620422003").await.unwrap().unwrap();

        assert_eq!(food.id, "3017620422003");
        assert_eq!(food.name, "Nutella");
        assert_eq!(food.brand.as_deref(), Some("Ferrero"));
        assert_eq!(food.category.as_deref(), Some("Spreads"));
        assert_eq!(food.serving_size, 15.0);
        assert!((food.nutrition.calories - 80.85).abs() < 1e-9);
        assert!((food.nutrition.sodium - 6.42).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_lookup_without_serving_uses_100g() {
        let client = OpenFoodFactsClient::new(spawn_stub().await);
        let food = client.lookup("1111").await.unwrap().unwrap();
        assert_eq!(food.name, "Product 1111");
        assert_eq!(food.serving_size, 100.0);
        assert_eq!(food.nutrition.calories, 100.0);
    }

    #[tokio::test]
    async fn test_unknown_barcode_is_none() {
        let client = OpenFoodFactsClient::new(spawn_stub().await);
        assert!(client.lookup("0000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error() {
        let client = OpenFoodFactsClient::new(spawn_stub().await);
        let err = client.lookup("500").await.unwrap_err();
        assert!(matches!(err, OpenFoodFactsError::ApiError { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_rejects_non_numeric_barcode() {
        let client = OpenFoodFactsClient::default();
        let err = client.lookup("12/34").await.unwrap_err();
        assert!(matches!(err, OpenFoodFactsError::InvalidBarcode(_)));
    }
}
