//! Post-load integrity checks

use mapoteca_common::Result;
use sqlx::PgConnection;
use tracing::{error, info, warn};

use crate::loader::qualified_table;
use crate::tables::{EXPECTED_CLASS_TYPE_COMBINATIONS, IBGE_CODE_LENGTH, MUNICIPIOS_TABLE};

/// A discrepancy found by [`collect_issues`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Municipalities whose IBGE code is null or not 7 characters long
    InvalidIbgeCodes(i64),
    /// `t_classe_mapa_tipo_mapa` does not hold the expected combinations
    UnexpectedClassTypeCombinations { expected: i64, found: i64 },
    /// Themes without any theme type
    OrphanThemes(i64),
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::InvalidIbgeCodes(count) => {
                write!(f, "{} municipalities with an invalid IBGE code", count)
            },
            ValidationIssue::UnexpectedClassTypeCombinations { expected, found } => write!(
                f,
                "Expected {} map class/type combinations, found {}",
                expected, found
            ),
            ValidationIssue::OrphanThemes(count) => {
                write!(f, "{} themes without an associated theme type", count)
            },
        }
    }
}

/// Run every integrity check and log the outcome
///
/// Returns true when no issue was found. A failing query is logged and
/// counts as a failed validation; it never aborts the run.
pub async fn validate_data(conn: &mut PgConnection, schema: &str) -> bool {
    match collect_issues(conn, schema).await {
        Ok(issues) if issues.is_empty() => {
            info!("Validation complete: data is consistent");
            true
        },
        Ok(issues) => {
            warn!(issues = issues.len(), "Validation found problems");
            for issue in &issues {
                warn!("  - {}", issue);
            }
            false
        },
        Err(e) => {
            error!(error = %e, "Validation failed");
            false
        },
    }
}

/// Run the integrity checks and return the issues found
pub async fn collect_issues(
    conn: &mut PgConnection,
    schema: &str,
) -> Result<Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let invalid_codes = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {} WHERE codigo_ibge IS NULL OR LENGTH(codigo_ibge) <> $1",
        qualified_table(schema, MUNICIPIOS_TABLE)
    ))
    .bind(IBGE_CODE_LENGTH)
    .fetch_one(&mut *conn)
    .await?;
    if invalid_codes > 0 {
        issues.push(ValidationIssue::InvalidIbgeCodes(invalid_codes));
    }

    let combinations = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {}",
        qualified_table(schema, "t_classe_mapa_tipo_mapa")
    ))
    .fetch_one(&mut *conn)
    .await?;
    if combinations != EXPECTED_CLASS_TYPE_COMBINATIONS {
        issues.push(ValidationIssue::UnexpectedClassTypeCombinations {
            expected: EXPECTED_CLASS_TYPE_COMBINATIONS,
            found: combinations,
        });
    }

    let orphan_themes = sqlx::query_scalar::<_, i64>(&format!(
        r#"
        SELECT COUNT(*) FROM {} t
        LEFT JOIN {} ttt ON t.id_tema = ttt.id_tema
        WHERE ttt.id_tipo_tema IS NULL
        "#,
        qualified_table(schema, "t_tema"),
        qualified_table(schema, "t_tipo_tema_tema")
    ))
    .fetch_one(&mut *conn)
    .await?;
    if orphan_themes > 0 {
        issues.push(ValidationIssue::OrphanThemes(orphan_themes));
    }

    Ok(issues)
}
