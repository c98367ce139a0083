//! pathway-import - Bulk question import from a CSV file
//!
//! Reads the CSV, groups its rows per assessment slug and merges each group
//! into the matching assessment on a running pathway-api server.

use anyhow::{Context, Result};
use clap::Parser;
use pathway_common::config::TomlConfig;
use pathway_import::{run_import, HttpImporter};
use std::path::PathBuf;
use tracing::{info, warn};

/// Command-line arguments for pathway-import
#[derive(Parser, Debug)]
#[command(name = "pathway-import")]
#[command(about = "Import assessment questions from a CSV file")]
#[command(version)]
struct Args {
    /// CSV file with one question per row
    csv: PathBuf,

    /// Base URL of the pathway-api server
    #[arg(short, long, default_value = "http://127.0.0.1:5730", env = "PATHWAY_SERVER_URL")]
    server: String,

    /// Bearer token from `POST /api/auth/login`
    #[arg(short, long, env = "PATHWAY_API_TOKEN", hide_env_values = true)]
    token: String,

    /// TOML config file (only `[logging]` is used here)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .init();

    let csv_text = tokio::fs::read_to_string(&args.csv)
        .await
        .with_context(|| format!("Failed to read {}", args.csv.display()))?;

    info!("Importing questions from {} into {}", args.csv.display(), args.server);

    let importer = HttpImporter::new(&args.server, args.token)?;
    let summary = run_import(&csv_text, &importer).await?;

    for failure in &summary.failures {
        warn!(slug = %failure.slug, "Not imported: {}", failure.error);
    }
    info!(
        "Imported {} question(s) into {} assessment(s); {} assessment(s) failed",
        summary.question_count, summary.success_count, summary.error_count
    );

    Ok(())
}
