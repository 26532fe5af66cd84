use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "screenquest-cli", version, about = "Screenquest CLI")]
struct Cli {
    /// Use this config file instead of ~/.config/screenquest/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active reward table
    Rewards,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Replay a JSON script of actions against a fresh session
    Replay {
        /// Path to the script (JSON array of actions)
        script: PathBuf,
    },
    /// Log a night of sleep and get coaching advice
    Sleep {
        /// Hours slept
        #[arg(long)]
        hours: f64,
        /// Subjective quality, 1-10
        #[arg(long)]
        quality: u8,
    },
    /// Verify a workout photo to unlock screentime
    Workout {
        /// JPEG image of the workout
        image: PathBuf,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SCREENQUEST_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Rewards => commands::rewards::run(config_path),
        Commands::Config { action } => commands::config::run(action, config_path),
        Commands::Replay { script } => commands::replay::run(&script, config_path),
        Commands::Sleep { hours, quality } => commands::assistant::sleep(hours, quality, config_path),
        Commands::Workout { image } => commands::assistant::workout(&image, config_path),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
