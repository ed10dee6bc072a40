//! CSV source reader
//!
//! Turns a delimited file into [`Record`]s keyed by the header row. A file
//! that cannot be read never aborts the run: the source degrades to zero
//! records and the condition is logged.

use encoding_rs::Encoding;
use mapoteca_common::{MapotecaError, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// One source row: field names from the header row mapped to raw values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Build a record from ordered `(field, value)` pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();

        Self {
            columns: columns.into(),
            values,
        }
    }

    /// Raw value of `field`, if the row has that column
    pub fn get(&self, field: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == field)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    /// Field names in header order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of values the row carries; a short row has fewer than its columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the row carries no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(field, value)` pairs in header order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

/// Read every data row of `path`, decoding it with the `encoding` label
///
/// A missing or unreadable file yields an empty vector; the cause is logged.
pub fn read_records(path: &Path, encoding: &str) -> Vec<Record> {
    match try_read_records(path, encoding) {
        Ok(records) => {
            info!(path = %path.display(), records = records.len(), "Read records");
            records
        },
        Err(MapotecaError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            error!(path = %path.display(), "File not found");
            Vec::new()
        },
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read file");
            Vec::new()
        },
    }
}

/// Fallible form of [`read_records`]
pub fn try_read_records(path: &Path, encoding: &str) -> Result<Vec<Record>> {
    let bytes = std::fs::read(path)?;
    let text = decode(&bytes, encoding)?;
    parse_records(&text)
}

fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| MapotecaError::Encoding(label.to_string()))?;

    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(MapotecaError::Encoding(format!(
            "input is not valid {}",
            encoding.name()
        )));
    }

    Ok(text.into_owned())
}

fn parse_records(text: &str) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Arc<[String]> = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(Record {
            columns: Arc::clone(&columns),
            values: row.iter().map(str::to_string).collect(),
        });
    }

    Ok(records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_reads_rows_keyed_by_header() {
        let file = write_file(b"id_tema,codigo_tema,nome_tema\n1,SOC,Social\n2,ECO,\"Economia, renda\"\n");

        let records = read_records(file.path(), "utf-8");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].columns(), ["id_tema", "codigo_tema", "nome_tema"]);
        assert_eq!(records[0].get("codigo_tema"), Some("SOC"));
        assert_eq!(records[1].get("nome_tema"), Some("Economia, renda"));
        assert_eq!(records[1].get("missing"), None);
    }

    #[test]
    fn test_header_only_file_has_no_records() {
        let file = write_file(b"id_regiao,nome_regiao\n");
        assert!(read_records(file.path(), "utf-8").is_empty());
    }

    #[test]
    fn test_missing_file_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = read_records(&dir.path().join("nao_existe.csv"), "utf-8");
        assert!(records.is_empty());

        let err = try_read_records(&dir.path().join("nao_existe.csv"), "utf-8").unwrap_err();
        assert!(matches!(err, MapotecaError::Io(_)));
    }

    #[test]
    fn test_latin1_decoding() {
        // "São Paulo" in ISO-8859-1
        let file = write_file(b"nome\nS\xe3o Paulo\n");

        let records = read_records(file.path(), "latin1");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("nome"), Some("São Paulo"));
    }

    #[test]
    fn test_invalid_utf8_degrades_to_empty() {
        let file = write_file(b"nome\nS\xe3o Paulo\n");

        assert!(read_records(file.path(), "utf-8").is_empty());
        assert!(matches!(
            try_read_records(file.path(), "utf-8"),
            Err(MapotecaError::Encoding(_))
        ));
    }

    #[test]
    fn test_unknown_encoding_label() {
        let file = write_file(b"nome\nSalvador\n");
        assert!(matches!(
            try_read_records(file.path(), "klingon"),
            Err(MapotecaError::Encoding(_))
        ));
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let file = write_file(b"\xef\xbb\xbfcodigo_ibge,nome_municipio\n2927408,Salvador\n");

        let records = read_records(file.path(), "utf-8");

        assert_eq!(records[0].get("codigo_ibge"), Some("2927408"));
    }

    #[test]
    fn test_short_row_keeps_the_rest_of_the_file() {
        let file = write_file(b"id_regiao,nome_regiao,abrangencia\n1,Norte,x\n2,Sul\n3,Leste,y\n");

        let records = read_records(file.path(), "utf-8");

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].get("nome_regiao"), Some("Sul"));
        assert_eq!(records[1].get("abrangencia"), None);
        assert_eq!(records[1].len(), 2);
        assert_eq!(records[2].get("abrangencia"), Some("y"));
    }

    #[test]
    fn test_record_from_pairs() {
        let record = Record::from_pairs([("id_regiao", "1"), ("nome_regiao", "Norte")]);

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("nome_regiao"), Some("Norte"));
        assert_eq!(
            record.iter().collect::<Vec<_>>(),
            vec![("id_regiao", "1"), ("nome_regiao", "Norte")]
        );
    }
}
