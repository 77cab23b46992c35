//! Tabular records: the team roster and the round pairings.
//!
//! Tables are replaced wholesale whenever a file is opened; there is no
//! incremental merge and no validation beyond required columns.

pub mod loader;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use loader::load_table;

use crate::error::LoadError;

/// Join key column in the team file.
pub const TEAM_COLUMN: &str = "Team";
/// Affirmative team column in the round file.
pub const AFF_COLUMN: &str = "AFF";
/// Negative team column in the round file.
pub const NEG_COLUMN: &str = "NEG";

/// One row of a tabular file: field name → value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// An ordered sequence of records plus the header row they were read with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(headers: Vec<String>, records: Vec<Record>) -> Self {
        Self { headers, records }
    }

    /// Build a table from records alone, deriving headers from the first row.
    pub fn from_records(records: Vec<Record>) -> Self {
        let headers = records
            .first()
            .map(|r| r.fields().map(|(k, _)| k.to_string()).collect())
            .unwrap_or_default();
        Self { headers, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Fail with `MissingColumn` for the first required column not present.
    pub fn require_columns(&self, path: &Path, columns: &[&str]) -> Result<(), LoadError> {
        for column in columns {
            if !self.has_column(column) {
                return Err(LoadError::MissingColumn {
                    path: path.to_path_buf(),
                    column: (*column).to_string(),
                });
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Load a team roster. The file must have a `Team` column.
pub async fn load_teams(path: &Path) -> Result<Table, LoadError> {
    let table = load_table(path).await?;
    table.require_columns(path, &[TEAM_COLUMN])?;
    tracing::info!(path = %path.display(), teams = table.len(), "Loaded team file");
    Ok(table)
}

/// Load round pairings. The file must have `AFF` and `NEG` columns.
pub async fn load_rounds(path: &Path) -> Result<Table, LoadError> {
    let table = load_table(path).await?;
    table.require_columns(path, &[AFF_COLUMN, NEG_COLUMN])?;
    tracing::info!(path = %path.display(), rooms = table.len(), "Loaded round file");
    Ok(table)
}
