//! Post-load reporting: integrity validation and per-table statistics
//!
//! Reporting never fails a run. Discrepancies and query errors end up in the
//! log only.

pub mod statistics;
pub mod validation;

pub use statistics::{generate_statistics, table_counts, TableCount};
pub use validation::{collect_issues, validate_data, ValidationIssue};
