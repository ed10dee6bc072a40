//! Mapoteca CSV migration tool

use anyhow::Result;
use clap::Parser;
use mapoteca_common::logging::{init_logging, LogConfig};
use mapoteca_migrate::config::MigrationConfig;
use mapoteca_migrate::migration::{self, Mode};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "mapoteca-migrate")]
#[command(author, version, about = "Migrate Mapoteca CSV data into PostgreSQL")]
struct Cli {
    /// Directory with the CSV files (overrides CSV_DIR)
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Only validate the data already in the database
    #[arg(long)]
    validate: bool,

    /// Only print row counts per table
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("migration")
        .build()
        .merge_env()?;
    let guard = init_logging(&log_config)?;

    info!("{}", "=".repeat(70));
    info!("Mapoteca Digital - CSV data migration");
    info!("{}", "=".repeat(70));

    let config = match MigrationConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            drop(guard);
            return Err(e.into());
        },
    };
    let config = match cli.csv_dir {
        Some(dir) => config.with_csv_dir(dir),
        None => config,
    };

    let mode = Mode::from_flags(cli.validate, cli.stats);

    match migration::run(&config, mode).await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Database connection failed: {:#}", e);
            drop(guard);
            std::process::exit(1);
        },
    }
}
