//! Mapoteca Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the Mapoteca workspace members.
//!
//! - **Error Handling**: [`MapotecaError`] and the [`Result`] alias
//! - **Logging**: console plus per-run file logging built on `tracing`
//!
//! # Example
//!
//! ```no_run
//! use mapoteca_common::{Result, MapotecaError};
//!
//! fn require_dir(path: &std::path::Path) -> Result<()> {
//!     if !path.is_dir() {
//!         return Err(MapotecaError::config(format!("{} is not a directory", path.display())));
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{InvalidRow, MapotecaError, Result};
