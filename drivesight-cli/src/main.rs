//! DriveSight CLI - road-scene risk assessment from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage or configuration error
  65  Invalid input data (not an image, bad perception JSON)
  66  Input file cannot be read
  69  Perception service unavailable (fallback assessment)
  74  I/O error";

#[derive(Parser)]
#[command(name = "drivesight")]
#[command(author, version, about = "Road-scene risk assessment", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Suppress decorated output (errors are still reported)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess the driving risk of a road-scene image
    Assess {
        /// Path to a JPEG, PNG, GIF or WebP image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Use deterministic mock adapters instead of Gemini
        #[arg(long)]
        mock: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Score a perception JSON document ({"detections": [...], "scene": {...}})
    Score {
        /// Path to the perception JSON file
        #[arg(value_name = "DETECTIONS_JSON")]
        detections: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Assess { file, mock, format } => {
            commands::assess::execute(file, mock, format, cli.quiet).await
        }
        Commands::Score { detections, format } => {
            commands::score::execute(detections, format, cli.quiet)
        }
    };

    let exit = match result {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    std::process::ExitCode::from(exit.code)
}
