use chrono::NaiveDate;
use clap::{Args, Subcommand};
use nutrilog_core::rollup::{MissingDays, Period, PeriodAverage};
use nutrilog_core::state::ProgressState;
use nutrilog_core::ProgressEntry;
use serde::Serialize;

use super::{parse_date, print_json, state_error, CommandResult, Context, OutputFormat};

#[derive(Args)]
pub struct ProgressCommand {
    #[command(subcommand)]
    pub command: ProgressSubcommand,
}

#[derive(Subcommand)]
pub enum ProgressSubcommand {
    /// Record a weigh-in
    Record {
        /// Weight in kilograms
        weight: f64,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,

        /// Waist circumference in cm
        #[arg(long)]
        waist: Option<f64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Show weigh-ins, the weight trend and intake averages
    Show {
        /// Start date (YYYY-MM-DD), defaults to 30 days ago
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

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete the weigh-in of a day
    Delete {
        /// Date (YYYY-MM-DD)
        date: String,
    },
}

#[derive(Serialize)]
struct ProgressReport<'a> {
    from: NaiveDate,
    to: NaiveDate,
    period: Period,
    entries: &'a [ProgressEntry],
    weight_trend: &'a [(NaiveDate, f64)],
    weight_change: Option<f64>,
    bmi: Option<f64>,
    averages: &'a [PeriodAverage],
}

impl ProgressCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        match &self.command {
            ProgressSubcommand::Record {
                weight,
                date,
                body_fat,
                waist,
                notes,
            } => {
                let date = parse_date(date.as_deref())?;
                let mut entry = ProgressEntry::new(date, *weight);
                if let Some(pct) = body_fat {
                    entry = entry.with_body_fat(*pct);
                }
                if let Some(cm) = waist {
                    entry = entry.with_waist(*cm);
                }
                if let Some(n) = notes {
                    entry = entry.with_notes(n.as_str());
                }

                // Later weigh-ins must be loaded to tell whether this one is the newest.
                let today = parse_date(None)?;
                let mut state =
                    ProgressState::new(ctx.store.clone(), ctx.uid(), date, date.max(today));
                state.load().await;
                state.record(&entry).await;
                state_error(&state.error)?;

                println!("Recorded {:.1} kg on {}", weight, date);
                if let Some(bmi) = state.bmi() {
                    println!("BMI: {:.1}", bmi);
                }
                Ok(())
            }

            ProgressSubcommand::Show {
                from,
                to,
                period,
                skip_missing,
                format,
            } => {
                let to = parse_date(to.as_deref())?;
                let from = match from {
                    Some(f) => parse_date(Some(f))?,
                    None => to - chrono::Duration::days(30),
                };
                if from > to {
                    return Err(format!("Start date {} is after end date {}", from, to).into());
                }
                let missing = if *skip_missing {
                    MissingDays::Skip
                } else {
                    MissingDays::Zero
                };

                let mut state = ProgressState::new(ctx.store.clone(), ctx.uid(), from, to)
                    .with_period(*period)
                    .with_missing_days(missing);
                state.load().await;
                state_error(&state.error)?;

                match format {
                    OutputFormat::Json => print_json(&ProgressReport {
                        from,
                        to,
                        period: *period,
                        entries: &state.entries,
                        weight_trend: &state.weight_trend,
                        weight_change: state.weight_change(),
                        bmi: state.bmi(),
                        averages: &state.averages,
                    })?,
                    OutputFormat::Text => print_progress(&state),
                }
                Ok(())
            }

            ProgressSubcommand::Delete { date } => {
                let date = parse_date(Some(date))?;
                let mut state = ProgressState::new(ctx.store.clone(), ctx.uid(), date, date);
                state.delete(date).await;
                state_error(&state.error)?;
                println!("Deleted weigh-in for {}", date);
                Ok(())
            }
        }
    }
}

fn print_progress(state: &ProgressState) {
    println!("Progress {} to {}", state.from, state.to);
    println!("{}", "-".repeat(24));

    if state.entries.is_empty() {
        println!("No weigh-ins in range.");
    }
    for entry in &state.entries {
        let mut line = format!("  {}  {:.1} kg", entry.date, entry.weight_kg);
        if let Some(pct) = entry.body_fat_pct {
            line.push_str(&format!(", {:.1}% fat", pct));
        }
        if let Some(cm) = entry.waist_cm {
            line.push_str(&format!(", waist {:.0} cm", cm));
        }
        println!("{}", line);
    }
    if let Some(change) = state.weight_change() {
        println!("Change: {:+.1} kg", change);
    }
    if let Some(bmi) = state.bmi() {
        println!("Current BMI: {:.1}", bmi);
    }

    if !state.weight_trend.is_empty() {
        println!();
        println!("Average weight per {}:", state.period);
        for (start, kg) in &state.weight_trend {
            println!("  {}  {:.1} kg", start, kg);
        }
    }

    println!();
    println!("Intake per {}:", state.period);
    for average in &state.averages {
        println!("  {}", average);
    }
}
