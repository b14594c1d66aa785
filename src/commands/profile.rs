use clap::{Args, Subcommand};
use nutrilog_core::models::{ActivityLevel, MacroTargets, Objective, Sex};
use nutrilog_core::repo::ProfileRepository;
use nutrilog_core::Profile;
use serde::Serialize;

use super::{print_json, CommandResult, Context, OutputFormat};

#[derive(Args)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub command: ProfileSubcommand,
}

#[derive(Subcommand)]
pub enum ProfileSubcommand {
    /// Show the profile with BMI, energy needs and macro targets
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create the profile or change some of its fields
    Set {
        #[arg(long)]
        name: Option<String>,

        /// male or female
        #[arg(long)]
        sex: Option<Sex>,

        #[arg(long)]
        age: Option<u32>,

        /// Height in centimetres
        #[arg(long)]
        height: Option<f64>,

        /// Weight in kilograms
        #[arg(long)]
        weight: Option<f64>,

        /// sedentary, light, moderate, active, very_active
        #[arg(long)]
        activity: Option<ActivityLevel>,

        /// lose, maintain, gain
        #[arg(long)]
        objective: Option<Objective>,

        /// Target weight in kilograms
        #[arg(long)]
        target_weight: Option<f64>,

        /// Daily water goal in ml
        #[arg(long)]
        water_goal: Option<u32>,
    },

    /// Record a new body weight
    Weight {
        /// Weight in kilograms
        kg: f64,
    },

    /// Delete the profile
    Delete,
}

#[derive(Serialize)]
struct ProfileReport<'a> {
    profile: &'a Profile,
    bmi: f64,
    bmi_category: String,
    bmr: f64,
    tdee: f64,
    daily_calorie_goal: f64,
    macro_targets: MacroTargets,
}

impl<'a> ProfileReport<'a> {
    fn new(profile: &'a Profile) -> Self {
        Self {
            profile,
            bmi: profile.bmi(),
            bmi_category: profile.bmi_category().to_string(),
            bmr: profile.bmr(),
            tdee: profile.tdee(),
            daily_calorie_goal: profile.daily_calorie_goal(),
            macro_targets: profile.macro_targets(),
        }
    }
}

impl ProfileCommand {
    pub async fn run(&self, ctx: &Context) -> CommandResult {
        let repo = ProfileRepository::new(ctx.store.clone());

        match &self.command {
            ProfileSubcommand::Show { format } => {
                let profile = repo
                    .get(ctx.uid())
                    .await?
                    .ok_or_else(|| no_profile(ctx.uid()))?;
                let report = ProfileReport::new(&profile);
                match format {
                    OutputFormat::Json => print_json(&report)?,
                    OutputFormat::Text => print_report(&report),
                }
                Ok(())
            }

            ProfileSubcommand::Set {
                name,
                sex,
                age,
                height,
                weight,
                activity,
                objective,
                target_weight,
                water_goal,
            } => {
                let mut profile = match repo.get(ctx.uid()).await? {
                    Some(existing) => existing,
                    None => {
                        let missing: Vec<&str> = [
                            ("--name", name.is_none()),
                            ("--sex", sex.is_none()),
                            ("--age", age.is_none()),
                            ("--height", height.is_none()),
                            ("--weight", weight.is_none()),
                        ]
                        .into_iter()
                        .filter_map(|(flag, absent)| absent.then_some(flag))
                        .collect();
                        if !missing.is_empty() {
                            return Err(format!(
                                "No profile yet for '{}'. Also pass: {}",
                                ctx.uid(),
                                missing.join(", ")
                            )
                            .into());
                        }
                        Profile::new(
                            ctx.uid(),
                            name.clone().unwrap_or_default(),
                            sex.unwrap_or(Sex::Female),
                            age.unwrap_or_default(),
                            height.unwrap_or_default(),
                            weight.unwrap_or_default(),
                        )
                    }
                };

                if let Some(n) = name {
                    profile.name = n.clone();
                }
                if let Some(s) = sex {
                    profile.sex = *s;
                }
                if let Some(a) = age {
                    profile.age = *a;
                }
                if let Some(h) = height {
                    profile.height_cm = *h;
                }
                if let Some(w) = weight {
                    profile.weight_kg = *w;
                }
                if let Some(level) = activity {
                    profile.activity_level = *level;
                }
                if let Some(o) = objective {
                    profile.objective = *o;
                }
                if let Some(t) = target_weight {
                    profile.target_weight_kg = Some(*t);
                }
                if let Some(ml) = water_goal {
                    profile.water_goal_ml = *ml;
                }
                profile.updated_at = chrono::Utc::now();

                repo.save(&profile).await?;
                println!("Saved profile for {}", profile.name);
                print_report(&ProfileReport::new(&profile));
                Ok(())
            }

            ProfileSubcommand::Weight { kg } => {
                let profile = repo.update_weight(ctx.uid(), *kg).await?;
                println!(
                    "Weight set to {:.1} kg (BMI {:.1}, {})",
                    profile.weight_kg,
                    profile.bmi(),
                    profile.bmi_category()
                );
                Ok(())
            }

            ProfileSubcommand::Delete => {
                repo.delete(ctx.uid()).await?;
                println!("Deleted profile for {}", ctx.uid());
                Ok(())
            }
        }
    }
}

fn no_profile(uid: &str) -> String {
    format!(
        "No profile for '{}'. Create one with 'nutrilog profile set'.",
        uid
    )
}

fn print_report(report: &ProfileReport) {
    let p = report.profile;
    println!("{} ({}, {} years)", p.name, p.sex, p.age);
    println!("{}", "-".repeat(p.name.len().max(10)));
    println!("  Height:     {:.0} cm", p.height_cm);
    println!("  Weight:     {:.1} kg", p.weight_kg);
    if let Some(target) = p.target_weight_kg {
        println!("  Target:     {:.1} kg", target);
    }
    println!("  BMI:        {:.1} ({})", report.bmi, report.bmi_category);
    println!("  Activity:   {}", p.activity_level);
    println!("  Objective:  {}", p.objective);
    println!();
    println!("  BMR:        {:.0} kcal", report.bmr);
    println!("  TDEE:       {:.0} kcal", report.tdee);
    println!("  Daily goal: {:.0} kcal", report.daily_calorie_goal);
    println!(
        "  Macros:     P {:.0}g, C {:.0}g, F {:.0}g",
        report.macro_targets.protein_g, report.macro_targets.carbs_g, report.macro_targets.fat_g
    );
    println!("  Water goal: {} ml", p.water_goal_ml);
}
