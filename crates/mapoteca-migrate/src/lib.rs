//! Mapoteca Migration Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Loads the Mapoteca reference data (municipalities, regions, themes and
//! their associations) from CSV files into the `dados_mapoteca` schema.
//!
//! A run flows strictly through three stages:
//!
//! - **Reader** ([`reader`]): CSV file → [`reader::Record`]s keyed by header
//! - **Loader** ([`loader`]): batched insert-or-skip, or the validated
//!   municipality upsert
//! - **Reporter** ([`reporter`]): integrity checks and row counts
//!
//! # Example
//!
//! ```no_run
//! use mapoteca_migrate::{config::MigrationConfig, migration::{self, Mode}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MigrationConfig::load()?.with_csv_dir("./data/csv");
//!     migration::run(&config, Mode::Full).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod loader;
pub mod migration;
pub mod reader;
pub mod reporter;
pub mod tables;
