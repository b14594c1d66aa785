use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    ConfigCommand, Context, ExerciseCommand, FoodCommand, MealCommand, ProfileCommand,
    ProgressCommand, RecipeCommand, SummaryCommand, TeamCommand, WaterCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "nutrilog")]
#[command(version)]
#[command(about = "Track meals, exercise, water and weight", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage your profile and goals
    Profile(ProfileCommand),

    /// Search, scan and manage foods
    Food(FoodCommand),

    /// Log meals
    Meal(MealCommand),

    /// Manage exercises and log sessions
    Exercise(ExerciseCommand),

    /// Track water intake
    Water(WaterCommand),

    /// Record weigh-ins and view progress
    Progress(ProgressCommand),

    /// Search, generate and save recipes
    Recipe(RecipeCommand),

    /// Teams and their feeds
    Team(TeamCommand),

    /// Daily and period nutrition summaries
    Summary(SummaryCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    if let Commands::Config(cmd) = &command {
        return cmd.run(&config);
    }

    let ctx = Context::open(config)?;
    match command {
        Commands::Profile(cmd) => cmd.run(&ctx).await,
        Commands::Food(cmd) => cmd.run(&ctx).await,
        Commands::Meal(cmd) => cmd.run(&ctx).await,
        Commands::Exercise(cmd) => cmd.run(&ctx).await,
        Commands::Water(cmd) => cmd.run(&ctx).await,
        Commands::Progress(cmd) => cmd.run(&ctx).await,
        Commands::Recipe(cmd) => cmd.run(&ctx).await,
        Commands::Team(cmd) => cmd.run(&ctx).await,
        Commands::Summary(cmd) => cmd.run(&ctx).await,
        Commands::Config(_) => Ok(()),
    }
}
