//! Row counts per destination table

use sqlx::PgConnection;
use tracing::{error, info};

use crate::loader::qualified_table;
use crate::tables::STATISTICS_TABLES;

/// Row count of one table; `rows` is `None` when the count failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub table: &'static str,
    pub rows: Option<i64>,
}

/// Count every statistics table; a failing table is logged and skipped
pub async fn table_counts(conn: &mut PgConnection, schema: &str) -> Vec<TableCount> {
    let mut counts = Vec::with_capacity(STATISTICS_TABLES.len());

    for &table in STATISTICS_TABLES {
        let sql = format!("SELECT COUNT(*) FROM {}", qualified_table(schema, table));
        let rows = match sqlx::query_scalar::<_, i64>(&sql).fetch_one(&mut *conn).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                error!(table = %table, error = %e, "Failed to count rows");
                None
            },
        };
        counts.push(TableCount { table, rows });
    }

    counts
}

/// Log the row count of every statistics table
pub async fn generate_statistics(conn: &mut PgConnection, schema: &str) {
    info!("=== Migration statistics ===");

    for count in table_counts(conn, schema).await {
        if let Some(rows) = count.rows {
            info!("  {}: {} rows", count.table, rows);
        }
    }

    info!("============================");
}
