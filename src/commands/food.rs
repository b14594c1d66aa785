use clap::{Args, Subcommand};
use nutrilog_core::state::FoodSearchState;
use nutrilog_core::{FoodItem, NutritionFacts};

use super::{print_json, state_error, CommandResult, Context, OutputFormat};

#[derive(Args)]
pub struct FoodCommand {
    #[command(subcommand)]
    pub command: FoodSubcommand,
}

#[derive(Subcommand)]
pub enum FoodSubcommand {
    /// Search foods by name prefix (catalog and your custom foods)
    Search {
        query: String,

        /// Maximum number of results
        #[arg(long, short, default_value = "20")]
        limit: usize,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Look up a product by barcode (catalog first, then Open Food Facts)
    Barcode {
        code: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a food by ID
    Show {
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a food to the shared catalog, or to your own foods with --custom
    Add {
        name: String,

        /// Calories per serving
        #[arg(long)]
        calories: f64,

        /// Protein grams per serving
        #[arg(long, default_value = "0")]
        protein: f64,

        /// Carbohydrate grams per serving
        #[arg(long, default_value = "0")]
        carbs: f64,

        /// Fat grams per serving
        #[arg(long, default_value = "0")]
        fat: f64,

        #[arg(long, default_value = "0")]
        fiber: f64,

        #[arg(long, default_value = "0")]
        sugar: f64,

        /// Sodium milligrams per serving
        #[arg(long, default_value = "0")]
        sodium: f64,

        /// Serving size
        #[arg(long, default_value = "100")]
        serving: f64,

        /// Serving unit
        #[arg(long, default_value = "g")]
        unit: String,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        barcode: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Keep the food private to you
        #[arg(long)]
        custom: bool,
    },

    /// List your custom foods
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a food
    Delete {
        id: String,

        /// Delete one of your custom foods instead of a catalog entry
        #[arg(long)]
        custom: bool,
    },
}

impl FoodCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let foods = ctx.foods();

        match &self.command {
            FoodSubcommand::Search {
                query,
                limit,
                format,
            } => {
                let mut state = FoodSearchState::new(foods, ctx.uid()).with_limit(*limit);
                state.search(query).await;
                state_error(&state.error)?;

                match format {
                    OutputFormat::Json => print_json(&state.results)?,
                    OutputFormat::Text => {
                        if state.results.is_empty() {
                            println!("No foods match '{}'", query);
                        }
                        for food in &state.results {
                            println!("{}  {}", food.id, food);
                        }
                    }
                }
                Ok(())
            }

            FoodSubcommand::Barcode { code, format } => {
                let mut state = FoodSearchState::new(foods, ctx.uid());
                state.scan(code).await;
                state_error(&state.error)?;

                if let Some(food) = &state.selected {
                    match format {
                        OutputFormat::Json => print_json(food)?,
                        OutputFormat::Text => print_food(food),
                    }
                }
                Ok(())
            }

            FoodSubcommand::Show { id, format } => {
                let food = match foods.get_custom(ctx.uid(), id).await? {
                    Some(custom) => custom.item,
                    None => foods
                        .get(id)
                        .await?
                        .ok_or_else(|| format!("Food not found: {}", id))?,
                };
                match format {
                    OutputFormat::Json => print_json(&food)?,
                    OutputFormat::Text => print_food(&food),
                }
                Ok(())
            }

            FoodSubcommand::Add {
                name,
                calories,
                protein,
                carbs,
                fat,
                fiber,
                sugar,
                sodium,
                serving,
                unit,
                brand,
                barcode,
                category,
                custom,
            } => {
                let facts = NutritionFacts::new(*calories, *protein, *carbs, *fat)
                    .with_fiber(*fiber)
                    .with_sugar(*sugar)
                    .with_sodium(*sodium);
                let mut food =
                    FoodItem::new(name.as_str(), facts).with_serving(*serving, unit.as_str());
                if let Some(b) = brand {
                    food = food.with_brand(b.as_str());
                }
                if let Some(code) = barcode {
                    // Catalog products are keyed by barcode
                    food = food.with_barcode(code.as_str());
                    if !custom {
                        food = food.with_id(code.as_str());
                    }
                }
                if let Some(c) = category {
                    food = food.with_category(c.as_str());
                }

                let saved = if *custom {
                    foods.save_custom(ctx.uid(), &food).await?.item
                } else {
                    foods.save(&food).await?
                };
                println!("Added food:");
                println!();
                print_food(&saved);
                Ok(())
            }

            FoodSubcommand::List { format } => {
                let custom = foods.list_custom(ctx.uid()).await?;
                match format {
                    OutputFormat::Json => print_json(&custom)?,
                    OutputFormat::Text => {
                        if custom.is_empty() {
                            println!("No custom foods yet.");
                        }
                        for c in &custom {
                            println!("{}  {}", c.id(), c.item);
                        }
                    }
                }
                Ok(())
            }

            FoodSubcommand::Delete { id, custom } => {
                if *custom {
                    foods.delete_custom(ctx.uid(), id).await?;
                } else {
                    foods.delete(id).await?;
                }
                println!("Deleted food {}", id);
                Ok(())
            }
        }
    }
}

fn print_food(food: &FoodItem) {
    println!("{}", food.name);
    println!("{}", "-".repeat(food.name.len().max(10)));
    println!("  ID:        {}", food.id);
    if let Some(brand) = &food.brand {
        println!("  Brand:     {}", brand);
    }
    if let Some(barcode) = &food.barcode {
        println!("  Barcode:   {}", barcode);
    }
    if let Some(category) = &food.category {
        println!("  Category:  {}", category);
    }
    println!("  Serving:   {} {}", food.serving_size, food.serving_unit);
    let n = &food.nutrition;
    println!("  Calories:  {:.0} kcal", n.calories);
    println!("  Protein:   {:.1} g", n.protein);
    println!("  Carbs:     {:.1} g", n.carbs);
    println!("  Fat:       {:.1} g", n.fat);
    println!("  Fiber:     {:.1} g", n.fiber);
    println!("  Sugar:     {:.1} g", n.sugar);
    println!("  Sodium:    {:.0} mg", n.sodium);
}
