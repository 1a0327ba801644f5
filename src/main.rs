use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cellday::cli::commands::{self, RunOptions};
use cellday::config::content::ContentCatalog;
use cellday::config::game::GameConfig;

#[derive(Parser)]
#[command(name = "cellday")]
#[command(about = "Keep a virtual cell alive: balance ATP, waste, stress and protein")]
#[command(version)]
struct Cli {
    /// Path to the game configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Path to the event and badge catalog
    #[arg(long, default_value = "content.json")]
    content: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a headless game driven by the autopilot
    Run {
        /// Seed for organelle damage picks and event draws
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Progress file to restore from and save to
        #[arg(short, long, default_value = "progress.json")]
        save: PathBuf,

        /// Stop after this many simulated seconds
        #[arg(long)]
        max_seconds: Option<f64>,

        /// Simulation speed (0.5-2.0)
        #[arg(long, default_value_t = 1.0)]
        time_scale: f64,

        /// Chance the autopilot picks the right event answer
        #[arg(long, default_value_t = 0.7)]
        accuracy: f64,
    },

    /// Show saved statistics and badge progress
    Status {
        #[arg(short, long, default_value = "progress.json")]
        save: PathBuf,
    },

    /// List badges and which ones are earned
    Badges {
        #[arg(short, long, default_value = "progress.json")]
        save: PathBuf,
    },

    /// Delete saved progress
    Reset {
        #[arg(short, long, default_value = "progress.json")]
        save: PathBuf,
    },

    /// Validate the configuration and content files
    Check,
}

fn init_tracing(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn load_config(path: &str) -> GameConfig {
    match GameConfig::from_file(Path::new(path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_content(path: &str) -> ContentCatalog {
    match ContentCatalog::from_file(Path::new(path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading content: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            seed,
            save,
            max_seconds,
            time_scale,
            accuracy,
        } => {
            let config = load_config(&cli.config);
            init_tracing(&config.log_level, cli.log_json);
            let content = Arc::new(load_content(&cli.content));

            let options = RunOptions {
                seed,
                save_path: Some(save),
                max_seconds,
                time_scale,
                accuracy,
            };
            match commands::run_game(Arc::new(config), Arc::clone(&content), &options).await {
                Ok(outcome) => commands::print_run_outcome(&outcome, &content),
                Err(e) => {
                    eprintln!("Run error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Status { save } => {
            init_tracing("warn", cli.log_json);
            if let Err(e) = commands::status(&save) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Badges { save } => {
            init_tracing("warn", cli.log_json);
            let content = load_content(&cli.content);
            if let Err(e) = commands::list_badges(&content, &save) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Reset { save } => {
            init_tracing("warn", cli.log_json);
            if let Err(e) = commands::reset(&save) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Check => {
            init_tracing("warn", cli.log_json);
            if let Err(e) = commands::check(Path::new(&cli.config), Path::new(&cli.content)) {
                eprintln!("Configuration problems:\n{}", e);
                std::process::exit(1);
            }
            println!("All files valid");
        }
    }
}
