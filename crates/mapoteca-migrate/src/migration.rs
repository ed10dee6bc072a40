//! Migration run orchestration
//!
//! One connection per run. A full migration loads municipalities first, then
//! every other source file present in the CSV directory, and always finishes
//! with validation and statistics.

use anyhow::{Context, Result};
use sqlx::{Connection, PgConnection};
use tracing::{info, warn};

use crate::config::{DatabaseConfig, MigrationConfig};
use crate::loader::{insert_records, migrate_municipios};
use crate::reader::read_records;
use crate::reporter::{generate_statistics, validate_data};
use crate::tables::{MUNICIPIOS_FILE, MUNICIPIOS_TABLE, SOURCE_TABLES};

/// What a run does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Load every source, then validate and report statistics
    #[default]
    Full,
    /// Only run the integrity checks
    Validate,
    /// Only report row counts
    Stats,
}

impl Mode {
    /// Mode selected by the command-line flags; `validate` wins over `stats`
    pub fn from_flags(validate: bool, stats: bool) -> Self {
        if validate {
            Mode::Validate
        } else if stats {
            Mode::Stats
        } else {
            Mode::Full
        }
    }
}

/// Rows written for one source table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub table: &'static str,
    pub rows: usize,
}

/// Outcome of a full migration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub sources: Vec<SourceSummary>,
    pub municipios_skipped: usize,
    pub total: usize,
}

impl MigrationSummary {
    /// Rows written to `table`, if its source was loaded
    pub fn rows_for(&self, table: &str) -> Option<usize> {
        self.sources
            .iter()
            .find(|s| s.table == table)
            .map(|s| s.rows)
    }

    fn record(&mut self, table: &'static str, rows: usize) {
        self.sources.push(SourceSummary { table, rows });
        self.total += rows;
    }
}

/// Open the single connection used by a run
pub async fn connect(config: &DatabaseConfig) -> Result<PgConnection> {
    let conn = PgConnection::connect_with(&config.connect_options())
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database '{}' at {}:{}",
                config.name, config.host, config.port
            )
        })?;

    info!(database = %config.name, host = %config.host, "Connected to database");
    Ok(conn)
}

/// Connect, execute `mode` and close the connection
///
/// Only a connection failure is returned as an error.
pub async fn run(config: &MigrationConfig, mode: Mode) -> Result<Option<MigrationSummary>> {
    let mut conn = connect(&config.database).await?;

    let summary = execute(&mut conn, config, mode).await;

    if let Err(e) = conn.close().await {
        warn!(error = %e, "Failed to close connection cleanly");
    }
    info!("Connection closed");

    Ok(summary)
}

/// Execute `mode` on an open connection
///
/// Returns the migration summary for [`Mode::Full`].
pub async fn execute(
    conn: &mut PgConnection,
    config: &MigrationConfig,
    mode: Mode,
) -> Option<MigrationSummary> {
    match mode {
        Mode::Validate => {
            validate_data(conn, &config.schema).await;
            None
        },
        Mode::Stats => {
            generate_statistics(conn, &config.schema).await;
            None
        },
        Mode::Full => {
            let summary = migrate_all(&mut *conn, config).await;

            info!("Validating data integrity...");
            validate_data(conn, &config.schema).await;
            generate_statistics(conn, &config.schema).await;

            Some(summary)
        },
    }
}

/// Load every source file present in `config.csv_dir`
pub async fn migrate_all(conn: &mut PgConnection, config: &MigrationConfig) -> MigrationSummary {
    info!(csv_dir = %config.csv_dir.display(), "Starting data migration");

    let mut summary = MigrationSummary::default();

    let municipios_csv = config.csv_dir.join(MUNICIPIOS_FILE);
    if municipios_csv.exists() {
        info!("Migrating municipalities...");
        let stats = migrate_municipios(&mut *conn, config, &municipios_csv).await;
        summary.municipios_skipped = stats.skipped;
        summary.record(MUNICIPIOS_TABLE, stats.upserted);
    }

    for source in SOURCE_TABLES.iter().filter(|s| !s.is_municipios()) {
        let path = config.csv_dir.join(source.file);
        if !path.exists() {
            continue;
        }

        info!(table = %source.table, "Migrating {}...", source.file);
        let records = read_records(&path, &config.encoding);
        let rows = insert_records(
            &mut *conn,
            &config.schema,
            source.table,
            &records,
            config.batch_size,
        )
        .await;
        summary.record(source.table, rows);
    }

    info!(
        total = summary.total,
        municipios_skipped = summary.municipios_skipped,
        "Migration complete: {} records in total",
        summary.total
    );

    summary
}
