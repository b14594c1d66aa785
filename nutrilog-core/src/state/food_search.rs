use super::capture;
use crate::models::FoodItem;
use crate::repo::FoodRepository;

pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Food search box and barcode lookups.
#[derive(Debug)]
pub struct FoodSearchState {
    pub uid: String,
    pub query: String,
    pub results: Vec<FoodItem>,
    /// Last product picked or found by barcode.
    pub selected: Option<FoodItem>,
    pub limit: usize,
    pub error: Option<String>,
    foods: FoodRepository,
}

impl FoodSearchState {
    pub fn new(foods: FoodRepository, uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            query: String::new(),
            results: Vec::new(),
            selected: None,
            limit: DEFAULT_RESULT_LIMIT,
            error: None,
            foods,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Runs a name-prefix search. A blank query clears the results.
    pub async fn search(&mut self, query: &str) {
        self.query = query.to_string();
        if query.trim().is_empty() {
            self.results.clear();
            self.error = None;
            return;
        }
        let result = self.foods.search(Some(self.uid.as_str()), query, self.limit).await;
        if let Some(results) = capture(&mut self.error, result) {
            self.results = results;
        }
    }

    pub async fn scan(&mut self, barcode: &str) {
        let result = self.foods.find_by_barcode(barcode).await;
        match capture(&mut self.error, result) {
            Some(Some(food)) => self.selected = Some(food),
            Some(None) => {
                self.selected = None;
                self.error = Some(format!("No product found for barcode {}", barcode.trim()));
            }
            None => {}
        }
    }

    /// Selects a search result by position.
    pub fn select(&mut self, index: usize) -> Option<&FoodItem> {
        self.selected = self.results.get(index).cloned();
        self.selected.as_ref()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.selected = None;
        self.error = None;
    }
}
