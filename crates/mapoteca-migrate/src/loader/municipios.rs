//! Municipality upsert
//!
//! Rows are validated and written one at a time. A row without an IBGE code
//! or a name is skipped and logged. On conflict only the name, the micro and
//! meso regions, the area and the population are overwritten; every other
//! column keeps its curated value. `nome_municipio_sem_acento` is never
//! written here, the store derives it.

use mapoteca_common::{InvalidRow, Result};
use sqlx::{Acquire, Connection, PgConnection, Postgres};
use std::path::Path;
use tracing::{error, info, warn};

use super::qualified_table;
use crate::config::MigrationConfig;
use crate::reader::{self, Record};
use crate::tables::MUNICIPIOS_TABLE;

/// Outcome of a municipality load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    /// Rows upserted and committed
    pub upserted: usize,
    /// Rows rejected by validation
    pub skipped: usize,
}

/// A validated `t_municipios` row
#[derive(Debug, Clone, PartialEq)]
pub struct MunicipioRow {
    pub codigo_ibge: String,
    pub nome_municipio: String,
    pub microrregiao: Option<String>,
    pub mesorregiao: Option<String>,
    pub regiao_intermediaria: Option<String>,
    pub regiao_imediata: Option<String>,
    pub territorio_identidade: Option<String>,
    pub area_km2: Option<f64>,
    pub populacao: Option<i64>,
    pub pib_per_capita: Option<f64>,
    pub idh: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TryFrom<&Record> for MunicipioRow {
    type Error = InvalidRow;

    fn try_from(record: &Record) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            codigo_ibge: required(record, "codigo_ibge")?,
            nome_municipio: required(record, "nome_municipio")?,
            microrregiao: optional_text(record, "microrregiao"),
            mesorregiao: optional_text(record, "mesorregiao"),
            regiao_intermediaria: optional_text(record, "regiao_intermediaria"),
            regiao_imediata: optional_text(record, "regiao_imediata"),
            territorio_identidade: optional_text(record, "territorio_identidade"),
            area_km2: optional_number(record, "area_km2")?,
            populacao: optional_number(record, "populacao")?,
            pib_per_capita: optional_number(record, "pib_per_capita")?,
            idh: optional_number(record, "idh")?,
            latitude: optional_number(record, "latitude")?,
            longitude: optional_number(record, "longitude")?,
        })
    }
}

fn required(record: &Record, field: &'static str) -> std::result::Result<String, InvalidRow> {
    optional_text(record, field).ok_or(InvalidRow::MissingField(field))
}

fn optional_text(record: &Record, field: &str) -> Option<String> {
    record
        .get(field)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn optional_number<T: std::str::FromStr>(
    record: &Record,
    field: &'static str,
) -> std::result::Result<Option<T>, InvalidRow> {
    match record.get(field).map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| InvalidRow::InvalidNumber {
                field,
                value: raw.to_string(),
            }),
    }
}

/// Upsert statement for `schema.t_municipios`
pub fn upsert_statement(schema: &str) -> String {
    format!(
        r#"
        INSERT INTO {} (
            codigo_ibge, nome_municipio, microrregiao, mesorregiao,
            regiao_intermediaria, regiao_imediata, territorio_identidade,
            area_km2, populacao, pib_per_capita, idh, latitude, longitude
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
        )
        ON CONFLICT (codigo_ibge) DO UPDATE SET
            nome_municipio = EXCLUDED.nome_municipio,
            microrregiao = EXCLUDED.microrregiao,
            mesorregiao = EXCLUDED.mesorregiao,
            area_km2 = EXCLUDED.area_km2,
            populacao = EXCLUDED.populacao,
            data_atualizacao = CURRENT_TIMESTAMP
        "#,
        qualified_table(schema, MUNICIPIOS_TABLE)
    )
}

/// Read `path` and upsert its rows into `t_municipios`
pub async fn migrate_municipios<'c, A>(
    conn: A,
    config: &MigrationConfig,
    path: &Path,
) -> UpsertStats
where
    A: Acquire<'c, Database = Postgres>,
{
    let records = reader::read_records(path, &config.encoding);
    if records.is_empty() {
        return UpsertStats::default();
    }

    upsert_municipios(conn, config, &records).await
}

/// Validate and upsert municipality records one at a time
///
/// Commits every `config.checkpoint_interval` upserted rows and once at the
/// end. A store error rolls back the open window and stops the load; the
/// returned stats count only committed rows.
pub async fn upsert_municipios<'c, A>(
    conn: A,
    config: &MigrationConfig,
    records: &[Record],
) -> UpsertStats
where
    A: Acquire<'c, Database = Postgres>,
{
    let mut stats = UpsertStats::default();

    let mut conn = match conn.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            error!(error = %e, "Failed to acquire connection");
            return stats;
        },
    };

    if let Err(e) = upsert_all(&mut *conn, config, records, &mut stats).await {
        error!(
            error = %e,
            upserted = stats.upserted,
            "Failed to migrate municipalities"
        );
        return stats;
    }

    info!(
        upserted = stats.upserted,
        skipped = stats.skipped,
        "Municipality migration complete"
    );
    stats
}

async fn upsert_all(
    conn: &mut PgConnection,
    config: &MigrationConfig,
    records: &[Record],
    stats: &mut UpsertStats,
) -> Result<()> {
    let statement = upsert_statement(&config.schema);
    let checkpoint = config.checkpoint_interval.max(1);
    let mut pending = 0;

    let mut tx = Connection::begin(&mut *conn).await?;

    for record in records {
        let Some(row) = accept_row(record) else {
            stats.skipped += 1;
            continue;
        };

        if let Err(e) = upsert_row(&mut tx, &statement, &row).await {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            return Err(e);
        }
        pending += 1;

        if pending == checkpoint {
            tx.commit().await?;
            stats.upserted += pending;
            pending = 0;
            info!(upserted = stats.upserted, "Municipality checkpoint committed");
            tx = Connection::begin(&mut *conn).await?;
        }
    }

    tx.commit().await?;
    stats.upserted += pending;

    Ok(())
}

/// Validated row for `record`, or `None` after logging why it was rejected
fn accept_row(record: &Record) -> Option<MunicipioRow> {
    match MunicipioRow::try_from(record) {
        Ok(row) => Some(row),
        Err(reason) => {
            warn!(
                reason = %reason,
                row = ?record.iter().collect::<Vec<_>>(),
                "Invalid municipality row skipped"
            );
            None
        },
    }
}

async fn upsert_row(conn: &mut PgConnection, statement: &str, row: &MunicipioRow) -> Result<()> {
    sqlx::query(statement)
        .bind(&row.codigo_ibge)
        .bind(&row.nome_municipio)
        .bind(&row.microrregiao)
        .bind(&row.mesorregiao)
        .bind(&row.regiao_intermediaria)
        .bind(&row.regiao_imediata)
        .bind(&row.territorio_identidade)
        .bind(row.area_km2)
        .bind(row.populacao)
        .bind(row.pib_per_capita)
        .bind(row.idh)
        .bind(row.latitude)
        .bind(row.longitude)
        .execute(conn)
        .await?;

    Ok(())
}
