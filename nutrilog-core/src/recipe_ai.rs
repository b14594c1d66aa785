//! Recipe translation and generation through an [`LlmProvider`].
//!
//! Both prompts ask for a plain-text answer with one field per line
//! (`Title:`, `Servings:`, ...) followed by `Ingredients:` and
//! `Instructions:` sections, which are parsed by line prefix.

use thiserror::Error;

use crate::llm::{LlmError, LlmProvider};
use crate::models::{Ingredient, MealType, NutritionFacts, Recipe, RecipeSource};

#[derive(Debug, Error, PartialEq)]
pub enum RecipeParseError {
    #[error("response has no title")]
    MissingTitle,

    #[error("response has no ingredients")]
    MissingIngredients,
}

#[derive(Debug, Error)]
pub enum RecipeAiError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Could not read the generated recipe: {0}")]
    Parse(#[from] RecipeParseError),
}

/// What to ask the model for.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub ingredients: Vec<String>,
    pub meal_type: Option<MealType>,
    /// Target kcal per serving.
    pub target_calories: Option<f64>,
    /// ISO 639-1 code for the answer.
    pub language: String,
}

impl GenerationRequest {
    pub fn new(ingredients: Vec<String>) -> Self {
        Self {
            ingredients,
            meal_type: None,
            target_calories: None,
            language: "en".to_string(),
        }
    }

    pub fn with_meal_type(mut self, meal_type: MealType) -> Self {
        self.meal_type = Some(meal_type);
        self
    }

    pub fn with_target_calories(mut self, kcal: f64) -> Self {
        self.target_calories = Some(kcal);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

pub fn translation_prompt(recipe: &Recipe, language: &str) -> String {
    let mut prompt = format!(
        "Translate the following recipe into the language with ISO 639-1 code '{}'.\n\
         Answer in plain text using exactly this layout:\n\
         Title: <translated title>\n\
         Ingredients:\n- <one ingredient per line, keep quantities>\n\
         Instructions:\n1. <one step per line>\n\n",
        language
    );
    prompt.push_str(&format!("Title: {}\nIngredients:\n", recipe.title));
    for ingredient in &recipe.ingredients {
        prompt.push_str(&format!("- {}\n", ingredient));
    }
    prompt.push_str("Instructions:\n");
    for (i, step) in recipe.instructions.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, step));
    }
    prompt
}

pub fn generation_prompt(request: &GenerationRequest) -> String {
    let mut prompt = format!(
        "Create a healthy recipe using these ingredients: {}.\n",
        request.ingredients.join(", ")
    );
    if let Some(meal_type) = request.meal_type {
        prompt.push_str(&format!("It should be suitable for {}.\n", meal_type));
    }
    if let Some(kcal) = request.target_calories {
        prompt.push_str(&format!("Aim for about {:.0} kcal per serving.\n", kcal));
    }
    prompt.push_str(&format!(
        "Write the answer in the language with ISO 639-1 code '{}', but keep the field \
         labels in English. Answer in plain text using exactly this layout:\n\
         Title: <name>\n\
         Servings: <number>\n\
         Calories: <kcal per serving>\n\
         Protein: <grams per serving>\n\
         Carbs: <grams per serving>\n\
         Fat: <grams per serving>\n\
         Ingredients:\n- <one ingredient per line with quantity>\n\
         Instructions:\n1. <one step per line>\n",
        request.language
    ));
    prompt
}

/// The fields found in a model answer.
#[derive(Debug, Default)]
struct ParsedAnswer {
    title: Option<String>,
    servings: Option<u32>,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    ingredients: Vec<Ingredient>,
    instructions: Vec<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Header,
    Ingredients,
    Instructions,
}

fn parse_answer(response: &str) -> ParsedAnswer {
    let mut answer = ParsedAnswer::default();
    let mut section = Section::Header;

    for raw in response.lines() {
        let line = raw.trim().trim_matches(|c: char| c == '*' || c == '#').trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = field(line, "ingredients") {
            section = Section::Ingredients;
            if !rest.is_empty() {
                let items = rest.split(',').map(str::trim).filter(|s| !s.is_empty());
                answer.ingredients.extend(items.map(Ingredient::parse));
            }
            continue;
        }
        if let Some(rest) = field(line, "instructions") {
            section = Section::Instructions;
            if !rest.is_empty() {
                answer.instructions.push(rest.to_string());
            }
            continue;
        }

        if let Some(value) = field(line, "title") {
            if !value.is_empty() {
                answer.title = Some(value.to_string());
            }
        } else if let Some(value) = field(line, "servings") {
            answer.servings = leading_number(value).map(|n| n.round().max(1.0) as u32);
        } else if let Some(value) = field(line, "calories") {
            answer.calories = leading_number(value);
        } else if let Some(value) = field(line, "protein") {
            answer.protein = leading_number(value);
        } else if let Some(value) = field(line, "carbs") {
            answer.carbs = leading_number(value);
        } else if let Some(value) = field(line, "fat") {
            answer.fat = leading_number(value);
        } else {
            match section {
                Section::Ingredients => {
                    answer.ingredients.push(Ingredient::parse(list_item(line)))
                }
                Section::Instructions => answer.instructions.push(list_item(line).to_string()),
                Section::Header => {}
            }
        }
    }

    answer
}

/// Text after `name:` when `line` starts with it, ignoring case.
fn field<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (label, rest) = line.split_once(':')?;
    let label = label.trim().trim_matches('*').trim();
    if label.eq_ignore_ascii_case(name) {
        Some(rest.trim().trim_start_matches('*').trim())
    } else {
        None
    }
}

/// Strips bullets (`-`, `*`, `•`) and step numbers (`1.`, `2)`).
fn list_item(line: &str) -> &str {
    let line = line
        .trim_start_matches(&['-', '*', '\u{2022}'][..])
        .trim_start();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        let marker = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'));
        // "1.5 cups" is a quantity, not a step number.
        if let Some(stripped) = marker.filter(|r| r.is_empty() || r.starts_with(' ')) {
            return stripped.trim_start();
        }
    }
    line
}

/// First number in `value`, e.g. `"30 g"` or `"about 450kcal"`. A `,`
/// followed by exactly three digits groups thousands (`1,250`); any other
/// `,` is a decimal separator (`12,5`).
fn leading_number(value: &str) -> Option<f64> {
    let start = value.find(|c: char| c.is_ascii_digit())?;
    let raw: String = value[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    let mut number = String::with_capacity(raw.len());
    for (i, part) in raw.split(',').enumerate() {
        if i > 0 {
            let digits = part.chars().take_while(|c| c.is_ascii_digit()).count();
            let thousands = digits == 3 && (part.len() == 3 || part[3..].starts_with('.'));
            if !thousands {
                number.push('.');
            }
        }
        number.push_str(part);
    }
    number.trim_end_matches('.').parse().ok()
}

/// Builds the translated recipe, keeping everything the answer does not cover.
pub fn parse_translation(
    response: &str,
    original: &Recipe,
    language: &str,
) -> Result<Recipe, RecipeParseError> {
    let answer = parse_answer(response);
    let title = answer.title.ok_or(RecipeParseError::MissingTitle)?;
    if answer.ingredients.is_empty() {
        return Err(RecipeParseError::MissingIngredients);
    }

    let mut translated = original.clone();
    translated.title = title;
    translated.ingredients = answer.ingredients;
    if !answer.instructions.is_empty() {
        translated.instructions = answer.instructions;
    }
    translated.language = language.to_string();
    translated.normalize();
    Ok(translated)
}

pub fn parse_generated(response: &str, language: &str) -> Result<Recipe, RecipeParseError> {
    let answer = parse_answer(response);
    let title = answer.title.ok_or(RecipeParseError::MissingTitle)?;
    if answer.ingredients.is_empty() {
        return Err(RecipeParseError::MissingIngredients);
    }

    let nutrition = NutritionFacts::new(
        answer.calories.unwrap_or(0.0),
        answer.protein.unwrap_or(0.0),
        answer.carbs.unwrap_or(0.0),
        answer.fat.unwrap_or(0.0),
    );
    Ok(Recipe::new(title, RecipeSource::Generated)
        .with_ingredients(answer.ingredients)
        .with_instructions(answer.instructions)
        .with_servings(answer.servings.unwrap_or(1))
        .with_nutrition(nutrition)
        .with_language(language))
}

/// Translates `recipe` into `language`.
///
/// Any provider or parse failure is logged and the original recipe returned.
pub async fn translate_recipe(
    provider: &dyn LlmProvider,
    recipe: &Recipe,
    language: &str,
) -> Recipe {
    if recipe.language.eq_ignore_ascii_case(language) {
        return recipe.clone();
    }

    let prompt = translation_prompt(recipe, language);
    let response = match provider.complete(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Translation of '{}' failed: {}", recipe.title, e);
            return recipe.clone();
        }
    };

    match parse_translation(&response, recipe, language) {
        Ok(translated) => translated,
        Err(e) => {
            tracing::warn!("Could not parse translation of '{}': {}", recipe.title, e);
            recipe.clone()
        }
    }
}

pub async fn generate_recipe(
    provider: &dyn LlmProvider,
    request: &GenerationRequest,
) -> Result<Recipe, RecipeAiError> {
    let prompt = generation_prompt(request);
    tracing::debug!(
        "Generating recipe with {} ({})",
        provider.provider_name(),
        provider.model_name()
    );
    let response = provider.complete(&prompt).await?;
    let mut recipe = parse_generated(&response, &request.language)?;
    if let Some(meal_type) = request.meal_type {
        recipe.tags.push(meal_type.to_string());
    }
    Ok(recipe)
}
