use clap::{Args, Subcommand};
use nutrilog_core::repo::MealRepository;
use nutrilog_core::state::DiaryState;
use nutrilog_core::{FoodItem, MealLog, MealType};
use std::collections::HashMap;

use super::{
    format_facts, parse_date, print_json, state_error, CommandResult, Context, OutputFormat,
};

#[derive(Args)]
pub struct MealCommand {
    #[command(subcommand)]
    pub command: MealSubcommand,
}

#[derive(Subcommand)]
pub enum MealSubcommand {
    /// Log a meal
    Log {
        /// Meal type (breakfast, lunch, dinner, snack)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        meal_type: MealType,

        /// Food and servings as FOOD_ID:SERVINGS (can be repeated)
        #[arg(long = "food", value_name = "FOOD_ID:SERVINGS", value_parser = parse_entry)]
        foods: Vec<(String, f64)>,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Add notes to the log
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show the meals logged on a day
    List {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a food to a logged meal, or change its servings
    AddEntry {
        meal_id: String,

        food_id: String,

        servings: f64,

        /// Date of the meal (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Remove a food from a logged meal
    RemoveEntry {
        meal_id: String,

        food_id: String,

        /// Date of the meal (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Delete a logged meal
    Delete {
        meal_id: String,

        /// Date of the meal (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// View meal history
    History {
        /// Start date (YYYY-MM-DD), defaults to 7 days ago
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn parse_entry(s: &str) -> Result<(String, f64), String> {
    let (id, servings) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("Invalid food '{}'. Use FOOD_ID:SERVINGS.", s))?;
    let servings: f64 = servings
        .parse()
        .map_err(|_| format!("Invalid servings '{}' in '{}'", servings, s))?;
    if id.is_empty() {
        return Err(format!("Missing food id in '{}'", s));
    }
    Ok((id.to_string(), servings))
}

impl MealCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        match &self.command {
            MealSubcommand::Log {
                meal_type,
                foods,
                date,
                notes,
            } => {
                let date = parse_date(date.as_deref())?;
                let mut meal = MealLog::new(date, *meal_type);
                for (food_id, servings) in foods {
                    meal.add_entry(food_id.as_str(), *servings);
                }
                if let Some(n) = notes {
                    meal = meal.with_notes(n.as_str());
                }

                let mut diary = DiaryState::new(ctx.store.clone(), ctx.uid(), date);
                let id = diary.log_meal(&meal).await;
                state_error(&diary.error)?;

                println!(
                    "Logged {} for {} ({})",
                    meal.meal_type,
                    date,
                    id.unwrap_or_default()
                );
                print_day_totals(&diary);
                Ok(())
            }

            MealSubcommand::List { date, format } => {
                let date = parse_date(date.as_deref())?;
                let mut diary = DiaryState::new(ctx.store.clone(), ctx.uid(), date);
                diary.load().await;
                state_error(&diary.error)?;

                match format {
                    OutputFormat::Json => print_json(&diary.meals)?,
                    OutputFormat::Text => {
                        let names = food_names(ctx, &diary.meals).await?;
                        println!("{}", date);
                        println!("{}", "-".repeat(10));
                        if diary.meals.is_empty() {
                            println!("No meals logged.");
                        }
                        for meal in &diary.meals {
                            print_meal(meal, &names);
                        }
                        println!();
                        print_day_totals(&diary);
                    }
                }
                Ok(())
            }

            MealSubcommand::AddEntry {
                meal_id,
                food_id,
                servings,
                date,
            } => {
                let date = parse_date(date.as_deref())?;
                let mut diary = DiaryState::new(ctx.store.clone(), ctx.uid(), date);
                diary.add_entry(meal_id, food_id, *servings).await;
                state_error(&diary.error)?;
                println!("Set {} to {} serving(s) in meal {}", food_id, servings, meal_id);
                print_day_totals(&diary);
                Ok(())
            }

            MealSubcommand::RemoveEntry {
                meal_id,
                food_id,
                date,
            } => {
                let date = parse_date(date.as_deref())?;
                let mut diary = DiaryState::new(ctx.store.clone(), ctx.uid(), date);
                diary.remove_entry(meal_id, food_id).await;
                state_error(&diary.error)?;
                println!("Removed {} from meal {}", food_id, meal_id);
                print_day_totals(&diary);
                Ok(())
            }

            MealSubcommand::Delete { meal_id, date } => {
                let date = parse_date(date.as_deref())?;
                let mut diary = DiaryState::new(ctx.store.clone(), ctx.uid(), date);
                diary.delete_meal(meal_id).await;
                state_error(&diary.error)?;
                println!("Deleted meal {}", meal_id);
                Ok(())
            }

            MealSubcommand::History { from, to, format } => {
                let to = parse_date(to.as_deref())?;
                let from = match from {
                    Some(f) => parse_date(Some(f))?,
                    None => to - chrono::Duration::days(7),
                };
                if from > to {
                    return Err(format!("Start date {} is after end date {}", from, to).into());
                }

                let meals = MealRepository::new(ctx.store.clone())
                    .list_range(ctx.uid(), from, to)
                    .await?;

                match format {
                    OutputFormat::Json => print_json(&meals)?,
                    OutputFormat::Text => {
                        if meals.is_empty() {
                            println!("No meals logged between {} and {}", from, to);
                            return Ok(());
                        }
                        let names = food_names(ctx, &meals).await?;
                        let mut current = None;
                        for meal in &meals {
                            if current != Some(meal.date) {
                                if current.is_some() {
                                    println!();
                                }
                                println!("{}", meal.date);
                                println!("{}", "-".repeat(10));
                                current = Some(meal.date);
                            }
                            print_meal(meal, &names);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

async fn food_names(
    ctx: &Context,
    meals: &[MealLog],
) -> Result<HashMap<String, FoodItem>, Box<dyn std::error::Error>> {
    let ids: Vec<&String> = meals.iter().flat_map(|m| m.entries.keys()).collect();
    Ok(ctx.foods().resolve(ctx.uid(), ids).await?)
}

fn print_meal(meal: &MealLog, foods: &HashMap<String, FoodItem>) {
    println!("  {} [{}]", meal.meal_type, meal.id);
    for (food_id, servings) in &meal.entries {
        match foods.get(food_id) {
            Some(food) => println!(
                "    - {} x{} ({})",
                food.name,
                servings,
                format_facts(&food.facts_for(*servings))
            ),
            None => println!("    - {} x{} (unknown food)", food_id, servings),
        }
    }
    if let Some(notes) = &meal.notes {
        println!("    Notes: {}", notes);
    }
}

fn print_day_totals(diary: &DiaryState) {
    let rollup = &diary.rollup;
    println!("Consumed: {}", format_facts(&rollup.consumed));
    println!("Burned:   {:.0} kcal", rollup.burned_calories);
    println!("Net:      {:.0} kcal", rollup.net_calories);
    if let (Some(goal), Some(remaining)) = (diary.calorie_goal(), diary.remaining_calories()) {
        println!("Goal:     {:.0} kcal ({:.0} remaining)", goal, remaining);
    }
}
