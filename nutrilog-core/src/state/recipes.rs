use std::sync::Arc;

use super::capture;
use crate::llm::LlmProvider;
use crate::models::Recipe;
use crate::recipe_ai::{self, GenerationRequest};
use crate::repo::RecipeRepository;

/// Recipe search, generation and the user's saved recipes.
///
/// Search results are translated into `language`; a failed translation keeps
/// the recipe as stored.
#[derive(Debug)]
pub struct RecipeState {
    pub uid: String,
    pub language: String,
    pub saved: Vec<Recipe>,
    pub results: Vec<Recipe>,
    pub generated: Option<Recipe>,
    pub error: Option<String>,
    recipes: RecipeRepository,
    provider: Arc<dyn LlmProvider>,
}

impl RecipeState {
    pub fn new(
        recipes: RecipeRepository,
        provider: Arc<dyn LlmProvider>,
        uid: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            language: language.into(),
            saved: Vec::new(),
            results: Vec::new(),
            generated: None,
            error: None,
            recipes,
            provider,
        }
    }

    pub async fn load_saved(&mut self) {
        let result = self.recipes.list(&self.uid).await;
        if let Some(saved) = capture(&mut self.error, result) {
            self.saved = saved;
        }
    }

    pub async fn search(&mut self, term: &str, limit: usize) {
        let result = self.recipes.search_catalog(term, limit).await;
        let Some(found) = capture(&mut self.error, result) else {
            return;
        };
        let mut translated = Vec::with_capacity(found.len());
        for recipe in &found {
            let recipe =
                recipe_ai::translate_recipe(self.provider.as_ref(), recipe, &self.language).await;
            translated.push(recipe);
        }
        self.results = translated;
    }

    /// Asks the provider for a recipe. A failed or unreadable answer leaves
    /// `generated` empty and the message in `error`.
    pub async fn generate(&mut self, request: GenerationRequest) {
        let request = request.with_language(self.language.clone());
        let result = recipe_ai::generate_recipe(self.provider.as_ref(), &request).await;
        self.generated = capture(&mut self.error, result);
    }

    pub async fn save(&mut self, recipe: &Recipe) {
        let result = self.recipes.save(&self.uid, recipe).await;
        if capture(&mut self.error, result).is_some() {
            self.load_saved().await;
        }
    }

    pub async fn delete(&mut self, id: &str) {
        let result = self.recipes.delete(&self.uid, id).await;
        if capture(&mut self.error, result).is_some() {
            self.saved.retain(|r| r.id != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeProvider;
    use crate::models::{Ingredient, RecipeSource};
    use crate::store::MemoryStore;

    const GENERATED: &str = "\
Title: Bean Chili
Servings: 4
Calories: 410
Ingredients:
- 400 g black beans
- 1 onion
Instructions:
1. Simmer everything for 30 minutes.
";

    const TRANSLATED: &str = "\
Title: Sopa de tomate
Ingredients:
- tomate
Instructions:
1. Cocinar.
";

    fn repo() -> RecipeRepository {
        RecipeRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_generate_and_save() {
        let provider =
            Arc::new(FakeProvider::new().with_response("create a healthy recipe", GENERATED));
        let mut state = RecipeState::new(repo(), provider, "u1", "en");

        state
            .generate(GenerationRequest::new(vec!["beans".to_string()]))
            .await;
        let recipe = state.generated.clone().unwrap();
        assert_eq!(recipe.title, "Bean Chili");
        assert_eq!(recipe.servings, 4);

        state.save(&recipe).await;
        assert_eq!(state.saved.len(), 1);

        state.delete(&recipe.id).await;
        assert!(state.saved.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_generation_is_a_message() {
        let provider =
            Arc::new(FakeProvider::new().with_default_response("I cannot help with that."));
        let mut state = RecipeState::new(repo(), provider, "u1", "en");

        state
            .generate(GenerationRequest::new(vec!["kale".to_string()]))
            .await;
        assert!(state.generated.is_none());
        assert_eq!(
            state.error.as_deref(),
            Some("Could not read the generated recipe: response has no title")
        );
    }

    #[tokio::test]
    async fn test_search_translates_results() {
        let recipes = repo();
        recipes
            .publish(
                &Recipe::new("Tomato soup", RecipeSource::Searched)
                    .with_ingredients(vec![Ingredient::named("tomato")]),
            )
            .await
            .unwrap();
        recipes
            .publish(&Recipe::new("Tomato salad", RecipeSource::Searched).with_language("es"))
            .await
            .unwrap();

        let provider = Arc::new(FakeProvider::new().with_response("tomato soup", TRANSLATED));
        let mut state = RecipeState::new(recipes, provider.clone(), "u1", "es");
        state.search("tomato", 10).await;

        let titles: Vec<&str> = state.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Tomato salad", "Sopa de tomate"]);
        // Already in Spanish: no request sent.
        assert_eq!(provider.prompts().len(), 1);
    }
}
