use clap::{Args, Subcommand};
use nutrilog_core::state::WaterState;
use serde::Serialize;

use super::{parse_date, print_json, state_error, CommandResult, Context, OutputFormat};

#[derive(Args)]
pub struct WaterCommand {
    #[command(subcommand)]
    pub command: WaterSubcommand,
}

#[derive(Subcommand)]
pub enum WaterSubcommand {
    /// Add water to a day's total
    Add {
        /// Amount in ml
        ml: u32,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Show a day's intake against the goal
    Show {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Set a day's intake back to zero
    Reset {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },
}

#[derive(Serialize)]
struct WaterReport {
    date: chrono::NaiveDate,
    amount_ml: u32,
    goal_ml: u32,
    remaining_ml: u32,
    progress: f64,
}

impl WaterCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        match &self.command {
            WaterSubcommand::Add { ml, date } => {
                let date = parse_date(date.as_deref())?;
                let mut state = WaterState::new(ctx.store.clone(), ctx.uid(), date);
                state.load().await;
                state.add(*ml).await;
                state_error(&state.error)?;
                print_water(&state);
                Ok(())
            }

            WaterSubcommand::Show { date, format } => {
                let date = parse_date(date.as_deref())?;
                let mut state = WaterState::new(ctx.store.clone(), ctx.uid(), date);
                state.load().await;
                state_error(&state.error)?;
                match format {
                    OutputFormat::Json => print_json(&WaterReport {
                        date,
                        amount_ml: state.log.amount_ml,
                        goal_ml: state.goal_ml,
                        remaining_ml: state.remaining_ml(),
                        progress: state.progress(),
                    })?,
                    OutputFormat::Text => print_water(&state),
                }
                Ok(())
            }

            WaterSubcommand::Reset { date } => {
                let date = parse_date(date.as_deref())?;
                let mut state = WaterState::new(ctx.store.clone(), ctx.uid(), date);
                state.reset().await;
                state_error(&state.error)?;
                println!("Reset water for {}", date);
                Ok(())
            }
        }
    }
}

fn print_water(state: &WaterState) {
    let filled = (state.progress() * 20.0).round() as usize;
    println!(
        "{}: {} / {} ml [{}{}] {:.0}%",
        state.date,
        state.log.amount_ml,
        state.goal_ml,
        "#".repeat(filled),
        ".".repeat(20 - filled),
        state.progress() * 100.0
    );
    if state.remaining_ml() > 0 {
        println!("{} ml to go", state.remaining_ml());
    } else {
        println!("Goal reached");
    }
}
