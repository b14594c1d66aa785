use std::collections::HashMap;

use super::{require, RepoError, SharedStore};
use crate::models::{CustomFoodItem, FoodItem};
use crate::openfoodfacts::OpenFoodFactsClient;
use crate::paths;
use crate::store::{Query, StoreExt};

/// The shared food catalog plus each user's custom foods.
#[derive(Debug, Clone)]
pub struct FoodRepository {
    store: SharedStore,
    lookup: Option<OpenFoodFactsClient>,
}

impl FoodRepository {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            lookup: None,
        }
    }

    /// Enables barcode lookups for products missing from the catalog.
    pub fn with_lookup(mut self, client: OpenFoodFactsClient) -> Self {
        self.lookup = Some(client);
        self
    }

    pub async fn get(&self, id: &str) -> Result<Option<FoodItem>, RepoError> {
        Ok(self.store.get_as(&paths::food(id)?).await?)
    }

    pub async fn save(&self, food: &FoodItem) -> Result<FoodItem, RepoError> {
        let food = prepared(food)?;
        self.store.set_as(&paths::food(&food.id)?, &food).await?;
        Ok(food)
    }

    pub async fn delete(&self, id: &str) -> Result<(), RepoError> {
        Ok(self.store.remove(&paths::food(id)?).await?)
    }

    /// Foods whose name starts with `prefix`, ignoring case, sorted by name.
    ///
    /// With `uid`, the user's custom foods are searched too; a custom food
    /// hides a catalog entry with the same id.
    pub async fn search(
        &self,
        uid: Option<&str>,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<FoodItem>, RepoError> {
        let prefix = prefix.trim().to_lowercase();
        let query = Query::by_child("search_name").prefix(&prefix).limit(limit);

        let mut found: HashMap<String, FoodItem> = self
            .store
            .query_as::<FoodItem>(&paths::foods()?, &query)
            .await?
            .into_iter()
            .collect();

        if let Some(uid) = uid {
            let custom = self
                .store
                .query_as::<CustomFoodItem>(&paths::custom_foods(uid)?, &query)
                .await?;
            found.extend(custom.into_iter().map(|(id, c)| (id, c.item)));
        }

        let mut foods: Vec<FoodItem> = found.into_values().collect();
        foods.sort_by(|a, b| a.search_name.cmp(&b.search_name).then(a.id.cmp(&b.id)));
        foods.truncate(limit);
        Ok(foods)
    }

    /// Finds a product by barcode: the catalog first, then Open Food Facts.
    ///
    /// Products found remotely are saved into the catalog.
    pub async fn find_by_barcode(&self, barcode: &str) -> Result<Option<FoodItem>, RepoError> {
        let barcode = barcode.trim();
        require(!barcode.is_empty(), "barcode is required")?;

        let query = Query::by_child("barcode")
            .start_at(barcode)
            .end_at(barcode)
            .limit(1);
        let local = self
            .store
            .query_as::<FoodItem>(&paths::foods()?, &query)
            .await?;
        if let Some((_, food)) = local.into_iter().next() {
            return Ok(Some(food));
        }

        let Some(client) = &self.lookup else {
            return Ok(None);
        };
        match client.lookup(barcode).await? {
            Some(food) => {
                tracing::info!("Caching product {} ({})", food.name, barcode);
                Ok(Some(self.save(&food).await?))
            }
            None => Ok(None),
        }
    }

    pub async fn save_custom(
        &self,
        uid: &str,
        food: &FoodItem,
    ) -> Result<CustomFoodItem, RepoError> {
        let custom = CustomFoodItem::new(uid, prepared(food)?);
        self.store
            .set_as(&paths::custom_food(uid, custom.id())?, &custom)
            .await?;
        Ok(custom)
    }

    pub async fn get_custom(
        &self,
        uid: &str,
        id: &str,
    ) -> Result<Option<CustomFoodItem>, RepoError> {
        Ok(self.store.get_as(&paths::custom_food(uid, id)?).await?)
    }

    pub async fn list_custom(&self, uid: &str) -> Result<Vec<CustomFoodItem>, RepoError> {
        let mut items: Vec<CustomFoodItem> = self
            .store
            .children_as(&paths::custom_foods(uid)?)
            .await?
            .into_iter()
            .map(|(_, item)| item)
            .collect();
        items.sort_by(|a, b| a.item.search_name.cmp(&b.item.search_name));
        Ok(items)
    }

    pub async fn delete_custom(&self, uid: &str, id: &str) -> Result<(), RepoError> {
        Ok(self.store.remove(&paths::custom_food(uid, id)?).await?)
    }

    /// The whole catalog as seen by `uid`: custom foods override catalog entries.
    pub async fn catalog_for(&self, uid: &str) -> Result<HashMap<String, FoodItem>, RepoError> {
        let mut catalog: HashMap<String, FoodItem> = self
            .store
            .children_as::<FoodItem>(&paths::foods()?)
            .await?
            .into_iter()
            .collect();
        for custom in self.list_custom(uid).await? {
            catalog.insert(custom.item.id.clone(), custom.item);
        }
        Ok(catalog)
    }

    /// Looks up `ids`, custom foods first. Unknown ids are left out.
    pub async fn resolve<'a, I>(
        &self,
        uid: &str,
        ids: I,
    ) -> Result<HashMap<String, FoodItem>, RepoError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut resolved = HashMap::new();
        for id in ids {
            if resolved.contains_key(id) {
                continue;
            }
            let food = match self.get_custom(uid, id).await? {
                Some(custom) => Some(custom.item),
                None => self.get(id).await?,
            };
            if let Some(food) = food {
                resolved.insert(id.clone(), food);
            }
        }
        Ok(resolved)
    }
}

fn prepared(food: &FoodItem) -> Result<FoodItem, RepoError> {
    require(!food.name.trim().is_empty(), "food name is required")?;
    require(food.serving_size > 0.0, "serving size must be positive")?;
    let mut food = food.clone();
    food.normalize();
    Ok(food)
}
