//! Converts electrode contact coordinates from scanner space to surface space.
//!
//! Run with: fscoords run <subject> <output_path> [--config fscoords.toml]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fscoords::Config;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Scanner <-> surface space contact coordinates")]
struct Args {
    /// TOML config; falls back to $FSCOORDS_CONFIG, then built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Transform a subject's contacts and write the lead -> contact JSON mapping.
    Run {
        subject: String,
        output_path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };

    match args.command {
        Command::Run {
            subject,
            output_path,
        } => {
            let summary = fscoords::run(&subject, &output_path, &config)?;
            if !summary.ingest.skipped.is_empty() {
                tracing::warn!(
                    "{} contact(s) not in the localization were skipped",
                    summary.ingest.skipped.len()
                );
            }
        }
    }
    Ok(())
}
