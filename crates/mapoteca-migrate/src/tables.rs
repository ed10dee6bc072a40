//! Fixed source and destination tables
//!
//! The file → table mapping, the statistics table list and the validation
//! constants are static configuration, declared here as constant tables.

/// Source file loaded by the municipality upsert instead of the generic loader.
pub const MUNICIPIOS_FILE: &str = "municipios.csv";

/// Destination table of [`MUNICIPIOS_FILE`].
pub const MUNICIPIOS_TABLE: &str = "t_municipios";

/// A source file and the table it is loaded into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTable {
    pub file: &'static str,
    pub table: &'static str,
}

impl SourceTable {
    /// Whether this source goes through the municipality upsert
    pub fn is_municipios(&self) -> bool {
        self.file == MUNICIPIOS_FILE
    }
}

/// Every source file, in load order.
pub const SOURCE_TABLES: &[SourceTable] = &[
    SourceTable {
        file: MUNICIPIOS_FILE,
        table: MUNICIPIOS_TABLE,
    },
    SourceTable {
        file: "regiao.csv",
        table: "t_regiao",
    },
    SourceTable {
        file: "regionalizacao_regiao.csv",
        table: "t_regionalizacao_regiao",
    },
    SourceTable {
        file: "tema.csv",
        table: "t_tema",
    },
    SourceTable {
        file: "tipo_tema_tema.csv",
        table: "t_tipo_tema_tema",
    },
];

/// Tables counted by the statistics report.
pub const STATISTICS_TABLES: &[&str] = &[
    "t_classe_mapa",
    "t_tipo_mapa",
    "t_anos",
    "t_escala",
    "t_cor",
    "t_tipo_regionalizacao",
    "t_regiao",
    "t_tipo_tema",
    "t_tema",
    "t_classe_mapa_tipo_mapa",
    "t_regionalizacao_regiao",
    "t_tipo_tema_tema",
    MUNICIPIOS_TABLE,
];

/// Length of a valid IBGE municipality code.
pub const IBGE_CODE_LENGTH: i32 = 7;

/// Rows expected in `t_classe_mapa_tipo_mapa` (map class × map type).
pub const EXPECTED_CLASS_TYPE_COMBINATIONS: i64 = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_municipios_is_specialized() {
        let specialized: Vec<_> = SOURCE_TABLES
            .iter()
            .filter(|source| source.is_municipios())
            .collect();
        assert_eq!(specialized.len(), 1);
        assert_eq!(specialized[0].table, MUNICIPIOS_TABLE);
    }

    #[test]
    fn test_every_loaded_table_is_counted() {
        for source in SOURCE_TABLES {
            assert!(
                STATISTICS_TABLES.contains(&source.table),
                "{} missing from statistics",
                source.table
            );
        }
    }
}
