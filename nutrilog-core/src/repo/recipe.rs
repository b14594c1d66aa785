use super::{require, RepoError, SharedStore};
use crate::models::Recipe;
use crate::paths;
use crate::store::StoreExt;

/// A user's saved recipes and the shared, searchable recipe catalog.
#[derive(Debug, Clone)]
pub struct RecipeRepository {
    store: SharedStore,
}

impl RecipeRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn save(&self, uid: &str, recipe: &Recipe) -> Result<Recipe, RepoError> {
        let recipe = prepared(recipe)?;
        self.store
            .set_as(&paths::recipe(uid, &recipe.id)?, &recipe)
            .await?;
        tracing::debug!("Saved recipe {} for {}", recipe.id, uid);
        Ok(recipe)
    }

    pub async fn get(&self, uid: &str, id: &str) -> Result<Option<Recipe>, RepoError> {
        Ok(self.store.get_as(&paths::recipe(uid, id)?).await?)
    }

    /// Saved recipes, newest first.
    pub async fn list(&self, uid: &str) -> Result<Vec<Recipe>, RepoError> {
        let mut recipes: Vec<Recipe> = self
            .store
            .children_as(&paths::recipes(uid)?)
            .await?
            .into_iter()
            .map(|(_, r)| r)
            .collect();
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    pub async fn delete(&self, uid: &str, id: &str) -> Result<(), RepoError> {
        Ok(self.store.remove(&paths::recipe(uid, id)?).await?)
    }

    /// Catalog recipes matching `term` in the title, a tag or an ingredient.
    pub async fn search_catalog(&self, term: &str, limit: usize) -> Result<Vec<Recipe>, RepoError> {
        let term = term.trim();
        let mut found: Vec<Recipe> = self
            .store
            .children_as::<Recipe>(&paths::recipe_catalog()?)
            .await?
            .into_iter()
            .map(|(_, r)| r)
            .filter(|r| term.is_empty() || r.matches(term))
            .collect();
        found.sort_by(|a, b| a.search_title.cmp(&b.search_title));
        found.truncate(limit);
        Ok(found)
    }

    /// Adds a recipe to the shared catalog.
    pub async fn publish(&self, recipe: &Recipe) -> Result<Recipe, RepoError> {
        let recipe = prepared(recipe)?;
        self.store
            .set_as(&paths::catalog_recipe(&recipe.id)?, &recipe)
            .await?;
        tracing::info!("Published recipe {} ({})", recipe.title, recipe.id);
        Ok(recipe)
    }
}

fn prepared(recipe: &Recipe) -> Result<Recipe, RepoError> {
    require(!recipe.title.trim().is_empty(), "recipe title is required")?;
    let mut recipe = recipe.clone();
    recipe.normalize();
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, RecipeSource};
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn repo() -> RecipeRepository {
        RecipeRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_save_list_delete() {
        let repo = repo();
        let mut older = Recipe::new("Lentil soup", RecipeSource::Manual);
        older.created_at = Utc::now() - Duration::days(1);
        let newer = Recipe::new("Green salad", RecipeSource::Generated);
        repo.save("u1", &older).await.unwrap();
        repo.save("u1", &newer).await.unwrap();

        let titles: Vec<String> = repo
            .list("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Green salad", "Lentil soup"]);

        assert_eq!(repo.get("u1", &newer.id).await.unwrap().unwrap().title, "Green salad");
        repo.delete("u1", &newer.id).await.unwrap();
        assert!(repo.get("u1", &newer.id).await.unwrap().is_none());
        assert!(repo.list("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_catalog() {
        let repo = repo();
        let soup = Recipe::new("Tomato Soup", RecipeSource::Searched)
            .with_ingredients(vec![Ingredient::named("tomato"), Ingredient::named("basil")]);
        let pasta = Recipe::new("Pasta al pomodoro", RecipeSource::Searched)
            .with_ingredients(vec![Ingredient::named("Tomato")])
            .with_tags(vec!["italian".to_string()]);
        let oats = Recipe::new("Overnight oats", RecipeSource::Searched);
        for recipe in [&soup, &pasta, &oats] {
            repo.publish(recipe).await.unwrap();
        }

        let titles: Vec<String> = repo
            .search_catalog("TOMATO", 10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Pasta al pomodoro", "Tomato Soup"]);

        assert_eq!(repo.search_catalog("italian", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search_catalog("", 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_requires_title() {
        let repo = repo();
        assert!(matches!(
            repo.save("u1", &Recipe::new("  ", RecipeSource::Manual)).await,
            Err(RepoError::Invalid(_))
        ));
    }
}
