use clap::{Args, Subcommand};
use nutrilog_core::repo::ExerciseRepository;
use nutrilog_core::state::DiaryState;
use nutrilog_core::{Exercise, ExerciseLog};

use super::{parse_date, print_json, state_error, CommandResult, Context, OutputFormat};

#[derive(Args)]
pub struct ExerciseCommand {
    #[command(subcommand)]
    pub command: ExerciseSubcommand,
}

#[derive(Subcommand)]
pub enum ExerciseSubcommand {
    /// Add an exercise to the shared catalog
    Add {
        name: String,

        /// Calories burned per minute
        calories_per_minute: f64,

        #[arg(long)]
        category: Option<String>,

        /// Catalog ID, generated when omitted
        #[arg(long)]
        id: Option<String>,
    },

    /// List the exercise catalog
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Log an exercise session
    Log {
        /// Exercise ID from the catalog
        exercise_id: String,

        /// Duration in minutes
        minutes: f64,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Show the sessions logged on a day
    Day {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a logged session
    Delete {
        log_id: String,

        /// Date of the session (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },
}

impl ExerciseCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let repo = ExerciseRepository::new(ctx.store.clone());

        match &self.command {
            ExerciseSubcommand::Add {
                name,
                calories_per_minute,
                category,
                id,
            } => {
                let mut exercise = Exercise::new(name.as_str(), *calories_per_minute);
                if let Some(id) = id {
                    exercise = exercise.with_id(id.as_str());
                }
                if let Some(c) = category {
                    exercise = exercise.with_category(c.as_str());
                }
                repo.save_exercise(&exercise).await?;
                println!(
                    "Added exercise '{}' ({}), {:.1} kcal/min",
                    exercise.name, exercise.id, exercise.calories_per_minute
                );
                Ok(())
            }

            ExerciseSubcommand::List { format } => {
                let exercises = repo.list_exercises().await?;
                match format {
                    OutputFormat::Json => print_json(&exercises)?,
                    OutputFormat::Text => {
                        if exercises.is_empty() {
                            println!("No exercises in the catalog.");
                        }
                        for e in &exercises {
                            match &e.category {
                                Some(c) => println!(
                                    "{}  {} [{}] {:.1} kcal/min",
                                    e.id, e.name, c, e.calories_per_minute
                                ),
                                None => println!(
                                    "{}  {} {:.1} kcal/min",
                                    e.id, e.name, e.calories_per_minute
                                ),
                            }
                        }
                    }
                }
                Ok(())
            }

            ExerciseSubcommand::Log {
                exercise_id,
                minutes,
                date,
                notes,
            } => {
                let date = parse_date(date.as_deref())?;
                let exercise = repo
                    .get_exercise(exercise_id)
                    .await?
                    .ok_or_else(|| format!("Exercise not found: {}", exercise_id))?;

                let mut entry = ExerciseLog::new(date, exercise_id.as_str(), *minutes);
                if let Some(n) = notes {
                    entry = entry.with_notes(n.as_str());
                }

                let mut diary = DiaryState::new(ctx.store.clone(), ctx.uid(), date);
                diary.log_exercise(&entry).await;
                state_error(&diary.error)?;

                println!(
                    "Logged {} min of {} on {} (~{:.0} kcal)",
                    minutes,
                    exercise.name,
                    date,
                    exercise.calories_for(*minutes)
                );
                println!("Burned today: {:.0} kcal", diary.rollup.burned_calories);
                Ok(())
            }

            ExerciseSubcommand::Day { date, format } => {
                let date = parse_date(date.as_deref())?;
                let logs = repo.list_for_date(ctx.uid(), date).await?;
                match format {
                    OutputFormat::Json => print_json(&logs)?,
                    OutputFormat::Text => {
                        let catalog = repo.resolve(logs.iter().map(|l| &l.exercise_id)).await?;
                        println!("{}", date);
                        println!("{}", "-".repeat(10));
                        if logs.is_empty() {
                            println!("No exercise logged.");
                        }
                        for log in &logs {
                            match catalog.get(&log.exercise_id) {
                                Some(e) => println!(
                                    "  {} {} min (~{:.0} kcal) [{}]",
                                    e.name,
                                    log.duration_minutes,
                                    e.calories_for(log.duration_minutes),
                                    log.id
                                ),
                                None => println!(
                                    "  {} {} min (unknown exercise) [{}]",
                                    log.exercise_id, log.duration_minutes, log.id
                                ),
                            }
                        }
                    }
                }
                Ok(())
            }

            ExerciseSubcommand::Delete { log_id, date } => {
                let date = parse_date(date.as_deref())?;
                let mut diary = DiaryState::new(ctx.store.clone(), ctx.uid(), date);
                diary.delete_exercise(log_id).await;
                state_error(&diary.error)?;
                println!("Deleted exercise log {}", log_id);
                Ok(())
            }
        }
    }
}
