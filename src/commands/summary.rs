use chrono::NaiveDate;
use clap::{Args, Subcommand};
use futures::StreamExt;
use nutrilog_core::models::{MacroPercentages, MacroTargets};
use nutrilog_core::repo::RollupRepository;
use nutrilog_core::rollup::{MissingDays, Period};
use nutrilog_core::state::DiaryState;
use nutrilog_core::DailyRollup;
use serde::Serialize;

use super::{
    format_facts, parse_date, print_json, state_error, CommandResult, Context, OutputFormat,
};

#[derive(Args)]
pub struct SummaryCommand {
    #[command(subcommand)]
    pub command: SummarySubcommand,
}

#[derive(Subcommand)]
pub enum SummarySubcommand {
    /// Totals for one day against the profile's goals
    Day {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Weekly or monthly averages of the stored daily totals
    Period {
        /// Start date (YYYY-MM-DD), defaults to 28 days ago
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,

        /// Bucket size: week or month
        #[arg(long, short, default_value = "week")]
        period: Period,

        /// Average only over days with records instead of counting gaps as zero
        #[arg(long)]
        skip_missing: bool,

        /// Recompute the stored totals of every day first
        #[arg(long)]
        refresh: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Recompute and store the daily totals for a range of days
    Refresh {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,
    },

    /// Print a day's stored totals every time they change
    Watch {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },
}

#[derive(Serialize)]
struct DayReport<'a> {
    rollup: &'a DailyRollup,
    calorie_goal: Option<f64>,
    remaining_calories: Option<f64>,
    macro_targets: Option<MacroTargets>,
    macro_percentages: MacroPercentages,
    meals: usize,
    exercise_sessions: usize,
}

impl SummaryCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let rollups = RollupRepository::new(ctx.store.clone());

        match &self.command {
            SummarySubcommand::Day { date, format } => {
                let date = parse_date(date.as_deref())?;
                let mut diary = DiaryState::new(ctx.store.clone(), ctx.uid(), date);
                diary.load().await;
                state_error(&diary.error)?;

                let report = DayReport {
                    rollup: &diary.rollup,
                    calorie_goal: diary.calorie_goal(),
                    remaining_calories: diary.remaining_calories(),
                    macro_targets: diary.macro_targets(),
                    macro_percentages: diary.macro_percentages(),
                    meals: diary.meals.len(),
                    exercise_sessions: diary.exercise.len(),
                };
                match format {
                    OutputFormat::Json => print_json(&report)?,
                    OutputFormat::Text => print_day(&report),
                }
                Ok(())
            }

            SummarySubcommand::Period {
                from,
                to,
                period,
                skip_missing,
                refresh,
                format,
            } => {
                let (from, to) = date_range(from.as_deref(), to.as_deref(), 28)?;
                if *refresh {
                    let report = rollups.refresh_range(ctx.uid(), from, to).await;
                    for (date, error) in &report.failed {
                        eprintln!("Warning: could not refresh {}: {}", date, error);
                    }
                }
                let missing = if *skip_missing {
                    MissingDays::Skip
                } else {
                    MissingDays::Zero
                };

                let averages = rollups
                    .aggregate(ctx.uid(), from, to, *period, missing)
                    .await?;
                match format {
                    OutputFormat::Json => print_json(&averages)?,
                    OutputFormat::Text => {
                        println!("Average per day, by {} ({} to {})", period, from, to);
                        println!("{}", "-".repeat(10));
                        for average in &averages {
                            println!("{}", average);
                        }
                    }
                }
                Ok(())
            }

            SummarySubcommand::Refresh { from, to } => {
                let (from, to) = date_range(Some(from), to.as_deref(), 0)?;
                let report = rollups.refresh_range(ctx.uid(), from, to).await;
                println!("Refreshed {} day(s)", report.refreshed.len());
                for (date, error) in &report.failed {
                    println!("  {} failed: {}", date, error);
                }
                if !report.failed.is_empty() {
                    let failed = report.failed.len();
                    return Err(format!("{} day(s) could not be refreshed", failed).into());
                }
                Ok(())
            }

            SummarySubcommand::Watch { date } => {
                let date = parse_date(date.as_deref())?;
                let mut updates = rollups.watch(ctx.uid(), date)?;
                loop {
                    tokio::select! {
                        update = updates.next() => match update {
                            Some(rollup) => match rollup? {
                                Some(r) => println!("{}", r),
                                None => println!("{}: nothing stored yet", date),
                            },
                            None => break,
                        },
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
                Ok(())
            }
        }
    }
}

/// `from`/`to` as dates; `to` defaults to today and `from` to `days_back` before it.
fn date_range(
    from: Option<&str>,
    to: Option<&str>,
    days_back: i64,
) -> Result<(NaiveDate, NaiveDate), Box<dyn std::error::Error>> {
    let to = parse_date(to)?;
    let from = match from {
        Some(f) => parse_date(Some(f))?,
        None => to - chrono::Duration::days(days_back),
    };
    if from > to {
        return Err(format!("Start date {} is after end date {}", from, to).into());
    }
    Ok((from, to))
}

fn print_day(report: &DayReport) {
    let r = report.rollup;
    println!("{}", r.date);
    println!("{}", "-".repeat(10));
    println!("Consumed:  {}", format_facts(&r.consumed));
    println!(
        "           fiber {:.1}g, sugar {:.1}g, sodium {:.0}mg",
        r.consumed.fiber, r.consumed.sugar, r.consumed.sodium
    );
    println!("Burned:    {:.0} kcal", r.burned_calories);
    println!("Net:       {:.0} kcal", r.net_calories);
    println!("Water:     {} ml", r.water_ml);
    println!(
        "Meals:     {} ({} exercise session(s))",
        report.meals, report.exercise_sessions
    );

    let pct = &report.macro_percentages;
    println!(
        "Macros:    P {:.0}%, C {:.0}%, F {:.0}%",
        pct.protein, pct.carbs, pct.fat
    );

    match (report.calorie_goal, report.remaining_calories) {
        (Some(goal), Some(remaining)) => {
            println!();
            println!("Goal:      {:.0} kcal", goal);
            println!("Remaining: {:.0} kcal", remaining);
            if let Some(t) = &report.macro_targets {
                println!(
                    "Targets:   P {:.0}g, C {:.0}g, F {:.0}g",
                    t.protein_g, t.carbs_g, t.fat_g
                );
            }
        }
        _ => {
            println!();
            println!("Set up a profile ('nutrilog profile set') to see goals.");
        }
    }
}
