//! intake - receipt submission from the terminal
//!
//! CLI binary that validates receipt scans and submits them to an invoice
//! endpoint.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Validate receipt scans and turn them into invoices")]
#[command(version)]
struct Cli {
    /// Path to a config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate files without submitting them
    Check {
        /// Receipt files (JPEG, PNG or PDF)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Submit files to the invoice endpoint
    Submit {
        /// Receipt files (JPEG, PNG or PDF)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Invoice endpoint (overrides config and INTAKE_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,

        /// Rotate every image clockwise by a multiple of 90 degrees before submitting
        #[arg(long, allow_hyphen_values = true)]
        rotate: Option<i32>,

        /// Preview the batch and prompt for confirmation before submitting
        #[arg(long, short = 'c')]
        confirm: bool,

        /// Dry run - show what would be submitted without calling the endpoint
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "receipt_intake=debug,intake=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = receipt_intake::config::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { files, json } => {
            cli::run_check(&config, &files, cli::CheckOptions { json }).await?;
        }
        Commands::Submit {
            files,
            endpoint,
            rotate,
            confirm,
            dry_run,
        } => {
            cli::run_submit(
                &config,
                &files,
                cli::SubmitOptions {
                    endpoint: endpoint.as_deref(),
                    rotate,
                    confirm,
                    dry_run,
                },
            )
            .await?;
        }
    }

    Ok(())
}
