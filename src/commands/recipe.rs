use clap::{Args, Subcommand};
use nutrilog_core::recipe_ai::GenerationRequest;
use nutrilog_core::repo::RecipeRepository;
use nutrilog_core::state::RecipeState;
use nutrilog_core::{Ingredient, MealType, NutritionFacts, Recipe, RecipeSource};

use super::{format_facts, print_json, state_error, CommandResult, Context, OutputFormat};

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// Search the shared recipe catalog
    Search {
        term: String,

        /// Maximum number of results
        #[arg(long, short, default_value = "10")]
        limit: usize,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate a recipe from ingredients (needs GEMINI_API_KEY)
    Generate {
        /// Ingredient to use (can be repeated)
        #[arg(long = "ingredient", short = 'i', required = true)]
        ingredients: Vec<String>,

        /// Meal type (breakfast, lunch, dinner, snack)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        meal_type: Option<MealType>,

        /// Target calories per serving
        #[arg(long)]
        calories: Option<f64>,

        /// Save the generated recipe to your recipes
        #[arg(long)]
        save: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a recipe by hand
    Add {
        title: String,

        /// Ingredient such as "200 g rice" (can be repeated)
        #[arg(long = "ingredient", short = 'i')]
        ingredients: Vec<String>,

        /// Instruction step (can be repeated)
        #[arg(long = "step", short = 's')]
        steps: Vec<String>,

        #[arg(long, default_value = "1")]
        servings: u32,

        /// Calories per serving
        #[arg(long, default_value = "0")]
        calories: f64,

        #[arg(long)]
        tag: Vec<String>,
    },

    /// List your saved recipes
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a saved recipe
    Show {
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a saved recipe
    Delete { id: String },

    /// Copy a saved recipe into the shared catalog
    Publish { id: String },
}

impl RecipeCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let repo = RecipeRepository::new(ctx.store.clone());
        let language = ctx.config.language.value.as_str();

        match &self.command {
            RecipeSubcommand::Search {
                term,
                limit,
                format,
            } => {
                let results = match ctx.llm() {
                    Ok(provider) => {
                        let mut state = RecipeState::new(repo, provider, ctx.uid(), language);
                        state.search(term, *limit).await;
                        state_error(&state.error)?;
                        state.results
                    }
                    Err(e) => {
                        tracing::debug!("Showing untranslated results: {}", e);
                        repo.search_catalog(term, *limit).await?
                    }
                };

                match format {
                    OutputFormat::Json => print_json(&results)?,
                    OutputFormat::Text => {
                        if results.is_empty() {
                            println!("No recipes match '{}'", term);
                        }
                        for recipe in &results {
                            println!("{}  {}", recipe.id, recipe);
                        }
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Generate {
                ingredients,
                meal_type,
                calories,
                save,
                format,
            } => {
                let mut request = GenerationRequest::new(ingredients.clone());
                if let Some(t) = meal_type {
                    request = request.with_meal_type(*t);
                }
                if let Some(kcal) = calories {
                    request = request.with_target_calories(*kcal);
                }

                let mut state = RecipeState::new(repo, ctx.llm()?, ctx.uid(), language);
                state.generate(request).await;
                state_error(&state.error)?;
                let recipe = state
                    .generated
                    .clone()
                    .ok_or("The generator returned no recipe")?;

                if *save {
                    state.save(&recipe).await;
                    state_error(&state.error)?;
                }

                match format {
                    OutputFormat::Json => print_json(&recipe)?,
                    OutputFormat::Text => {
                        print_recipe(&recipe);
                        if *save {
                            println!();
                            println!("Saved as {}", recipe.id);
                        }
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Add {
                title,
                ingredients,
                steps,
                servings,
                calories,
                tag,
            } => {
                let recipe = Recipe::new(title.as_str(), RecipeSource::Manual)
                    .with_ingredients(ingredients.iter().map(|i| Ingredient::parse(i)).collect())
                    .with_instructions(steps.clone())
                    .with_servings(*servings)
                    .with_nutrition(NutritionFacts::new(*calories, 0.0, 0.0, 0.0))
                    .with_language(language)
                    .with_tags(tag.clone());
                let saved = repo.save(ctx.uid(), &recipe).await?;
                println!("Saved recipe '{}' ({})", saved.title, saved.id);
                Ok(())
            }

            RecipeSubcommand::List { format } => {
                let recipes = repo.list(ctx.uid()).await?;
                match format {
                    OutputFormat::Json => print_json(&recipes)?,
                    OutputFormat::Text => {
                        if recipes.is_empty() {
                            println!("No saved recipes.");
                        }
                        for recipe in &recipes {
                            println!("{}  {}", recipe.id, recipe);
                        }
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Show { id, format } => {
                let recipe = repo
                    .get(ctx.uid(), id)
                    .await?
                    .ok_or_else(|| format!("Recipe not found: {}", id))?;
                match format {
                    OutputFormat::Json => print_json(&recipe)?,
                    OutputFormat::Text => print_recipe(&recipe),
                }
                Ok(())
            }

            RecipeSubcommand::Delete { id } => {
                repo.delete(ctx.uid(), id).await?;
                println!("Deleted recipe {}", id);
                Ok(())
            }

            RecipeSubcommand::Publish { id } => {
                let recipe = repo
                    .get(ctx.uid(), id)
                    .await?
                    .ok_or_else(|| format!("Recipe not found: {}", id))?;
                let published = repo.publish(&recipe).await?;
                println!("Published '{}' to the catalog", published.title);
                Ok(())
            }
        }
    }
}

fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe.title);
    println!("{}", "=".repeat(recipe.title.len().max(10)));
    println!(
        "Serves {} | per serving: {}",
        recipe.servings,
        format_facts(&recipe.nutrition_per_serving)
    );
    if !recipe.tags.is_empty() {
        println!("Tags: {}", recipe.tags.join(", "));
    }
    println!();
    println!("Ingredients:");
    for ingredient in &recipe.ingredients {
        println!("  - {}", ingredient);
    }
    println!();
    println!("Instructions:");
    for (i, step) in recipe.instructions.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
}
