//! Configuration management

use mapoteca_common::{MapotecaError, Result};
use sqlx::postgres::PgConnectOptions;
use std::path::PathBuf;

// ============================================================================
// Migration Configuration Constants
// ============================================================================

/// Default database name.
pub const DEFAULT_DB_NAME: &str = "mapoteca";

/// Default database user.
pub const DEFAULT_DB_USER: &str = "postgres";

/// Default database host.
pub const DEFAULT_DB_HOST: &str = "localhost";

/// Default database port.
pub const DEFAULT_DB_PORT: u16 = 5432;

/// Default directory holding the source CSV files.
pub const DEFAULT_CSV_DIR: &str = "./data/csv";

/// Default text encoding of the source files.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Default number of rows per bulk insert.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default number of municipality upserts between checkpoint commits.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 100;

/// Destination schema for every write.
pub const SCHEMA: &str = "dados_mapoteca";

/// Migration configuration, built once at startup
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub database: DatabaseConfig,
    pub csv_dir: PathBuf,
    pub encoding: String,
    pub schema: String,
    pub batch_size: usize,
    pub checkpoint_interval: usize,
}

/// Database connection parameters
#[derive(Clone)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DB_NAME.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: String::new(),
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
        }
    }
}

impl DatabaseConfig {
    /// Connection options for a single PostgreSQL connection
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            csv_dir: PathBuf::from(DEFAULT_CSV_DIR),
            encoding: DEFAULT_ENCODING.to_string(),
            schema: SCHEMA.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }
}

impl MigrationConfig {
    /// Load configuration from the environment (and `.env`, if present)
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Build configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let config = MigrationConfig {
            database: DatabaseConfig {
                name: std::env::var("DB_NAME").unwrap_or_else(|_| DEFAULT_DB_NAME.to_string()),
                user: std::env::var("DB_USER").unwrap_or_else(|_| DEFAULT_DB_USER.to_string()),
                password: std::env::var("DB_PASSWORD").unwrap_or_default(),
                host: std::env::var("DB_HOST").unwrap_or_else(|_| DEFAULT_DB_HOST.to_string()),
                port: std::env::var("DB_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DB_PORT),
            },
            csv_dir: std::env::var("CSV_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CSV_DIR)),
            encoding: std::env::var("CSV_ENCODING")
                .unwrap_or_else(|_| DEFAULT_ENCODING.to_string()),
            schema: SCHEMA.to_string(),
            batch_size: std::env::var("MIGRATION_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BATCH_SIZE),
            checkpoint_interval: std::env::var("MIGRATION_CHECKPOINT_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CHECKPOINT_INTERVAL),
        };

        config.validate()?;

        Ok(config)
    }

    /// Replace the source directory (the `--csv-dir` flag)
    pub fn with_csv_dir(mut self, csv_dir: impl Into<PathBuf>) -> Self {
        self.csv_dir = csv_dir.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.host.is_empty() {
            return Err(MapotecaError::config("DB_HOST cannot be empty"));
        }

        if self.database.name.is_empty() {
            return Err(MapotecaError::config("DB_NAME cannot be empty"));
        }

        if self.database.port == 0 {
            return Err(MapotecaError::config("DB_PORT must be greater than 0"));
        }

        if self.batch_size == 0 {
            return Err(MapotecaError::config("Batch size must be greater than 0"));
        }

        if self.checkpoint_interval == 0 {
            return Err(MapotecaError::config(
                "Checkpoint interval must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MigrationConfig::default();
        assert_eq!(config.database.name, "mapoteca");
        assert_eq!(config.database.user, "postgres");
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.csv_dir, PathBuf::from("./data/csv"));
        assert_eq!(config.schema, "dados_mapoteca");
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.checkpoint_interval, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_csv_dir_override() {
        let config = MigrationConfig::default().with_csv_dir("/tmp/entrada");
        assert_eq!(config.csv_dir, PathBuf::from("/tmp/entrada"));
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let config = MigrationConfig {
            batch_size: 0,
            ..MigrationConfig::default()
        };
        assert!(matches!(config.validate(), Err(MapotecaError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let mut config = MigrationConfig::default();
        config.database.host.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let database = DatabaseConfig {
            password: "segredo".to_string(),
            ..DatabaseConfig::default()
        };
        let rendered = format!("{:?}", database);
        assert!(!rendered.contains("segredo"));
        assert!(rendered.contains("<redacted>"));
    }
}
