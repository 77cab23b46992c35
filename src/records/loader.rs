//! CSV loading. Columns are taken from the header row.

use std::path::Path;

use super::{Record, Table};
use crate::error::LoadError;

/// Read a CSV file into a [`Table`].
///
/// Rows shorter than the header get empty strings for the missing cells;
/// extra cells beyond the header are dropped. A leading UTF-8 BOM is ignored.
pub async fn load_table(path: &Path) -> Result<Table, LoadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(path, &bytes)
}

/// Parse CSV bytes. `path` is only used for error messages.
pub fn parse_table(path: &Path, bytes: &[u8]) -> Result<Table, LoadError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let parse_err = |e: csv::Error| LoadError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(parse_err)?;
        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), row.get(i).unwrap_or("").to_string()))
            .collect();
        records.push(record);
    }

    tracing::debug!(
        path = %path.display(),
        columns = headers.len(),
        rows = records.len(),
        "Parsed CSV"
    );

    Ok(Table::new(headers, records))
}
