//! Loaders writing source records into the destination schema
//!
//! - [`generic`]: batched `INSERT ... ON CONFLICT DO NOTHING` for any table
//! - [`municipios`]: row-by-row validated upsert into `t_municipios`
//!
//! Both commit incrementally: a failure rolls back only the open batch (or
//! checkpoint window) and the loader reports how many rows were committed
//! before it.

pub mod generic;
pub mod municipios;

pub use generic::insert_records;
pub use municipios::{migrate_municipios, upsert_municipios, MunicipioRow, UpsertStats};

/// Quote a PostgreSQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Schema-qualified, quoted table name
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}
