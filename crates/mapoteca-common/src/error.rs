//! Error types for the Mapoteca migration tools

use thiserror::Error;

/// Result type alias for Mapoteca operations
pub type Result<T> = std::result::Result<T, MapotecaError>;

/// Main error type for Mapoteca
#[derive(Error, Debug)]
pub enum MapotecaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unsupported text encoding: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid row: {0}")]
    InvalidRow(#[from] InvalidRow),
}

/// Reasons a source row is rejected before reaching the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRow {
    #[error("required field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("field '{field}' is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

impl MapotecaError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_row_messages() {
        let err = InvalidRow::MissingField("nome_municipio");
        assert_eq!(
            err.to_string(),
            "required field 'nome_municipio' is missing or empty"
        );

        let err = MapotecaError::from(InvalidRow::InvalidNumber {
            field: "populacao",
            value: "abc".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Invalid row: field 'populacao' is not a valid number: 'abc'"
        );
    }
}
