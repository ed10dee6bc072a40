//! Batched insert for tables without special handling
//!
//! Each batch is sent as a single JSONB parameter and expanded with
//! `jsonb_populate_recordset`, so PostgreSQL coerces every raw text value to
//! the declared type of its destination column.

use mapoteca_common::Result;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{Acquire, Connection, PgConnection, Postgres};
use tracing::{error, info, warn};

use super::{qualified_table, quote_ident};
use crate::reader::Record;

/// Insert `records` into `schema.table` in batches of `batch_size`
///
/// Rows whose unique key already exists are left untouched. Every batch is
/// committed on its own; on a store error the failing batch is rolled back
/// and the rows committed before it are returned.
pub async fn insert_records<'c, A>(
    conn: A,
    schema: &str,
    table: &str,
    records: &[Record],
    batch_size: usize,
) -> usize
where
    A: Acquire<'c, Database = Postgres>,
{
    let Some(first) = records.first() else {
        warn!(table = %table, "No data to insert");
        return 0;
    };

    let mut conn = match conn.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            error!(table = %table, error = %e, "Failed to acquire connection");
            return 0;
        },
    };

    let columns = first.columns().to_vec();
    let statement = insert_statement(schema, table, &columns);
    let total = records.len();
    let mut committed = 0;

    for batch in records.chunks(batch_size.max(1)) {
        match insert_batch(&mut *conn, &statement, &columns, batch).await {
            Ok(inserted) => {
                committed += batch.len();
                info!(
                    table = %table,
                    submitted = batch.len(),
                    inserted,
                    "Batch committed ({}/{})",
                    committed,
                    total
                );
            },
            Err(e) => {
                error!(
                    table = %table,
                    error = %e,
                    committed,
                    "Failed to insert batch, stopping this source"
                );
                return committed;
            },
        }
    }

    info!(table = %table, rows = committed, "Insert complete");
    committed
}

/// Bulk insert statement for `columns`, taking the batch as `$1`
pub fn insert_statement(schema: &str, table: &str, columns: &[String]) -> String {
    let target = qualified_table(schema, table);
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {target} ({column_list}) \
         SELECT {column_list} FROM jsonb_populate_recordset(NULL::{target}, $1) \
         ON CONFLICT DO NOTHING"
    )
}

/// JSON object for one record, restricted to `columns`; absent fields are null
pub fn batch_row(columns: &[String], record: &Record) -> Map<String, Value> {
    columns
        .iter()
        .map(|column| {
            let value = record
                .get(column)
                .map_or(Value::Null, |v| Value::String(v.to_string()));
            (column.clone(), value)
        })
        .collect()
}

async fn insert_batch(
    conn: &mut PgConnection,
    statement: &str,
    columns: &[String],
    batch: &[Record],
) -> Result<u64> {
    let rows: Vec<Map<String, Value>> = batch.iter().map(|r| batch_row(columns, r)).collect();

    let mut tx = Connection::begin(&mut *conn).await?;

    match sqlx::query(statement).bind(Json(rows)).execute(&mut *tx).await {
        Ok(done) => {
            tx.commit().await?;
            Ok(done.rows_affected())
        },
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e.into())
        },
    }
}
