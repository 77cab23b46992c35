//! Settings persisted as a JSON file on disk.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::SettingsStore;
use crate::config::Settings;
use crate::error::SettingsError;

/// JSON file settings store.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_err(&self, source: std::io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn load(&self) -> Result<Settings, SettingsError> {
        if !fs::try_exists(&self.path).await.map_err(|e| self.io_err(e))? {
            tracing::debug!(path = %self.path.display(), "No settings file, using defaults");
            return Ok(Settings::default());
        }

        let raw = fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_err(e))?;
        if raw.trim().is_empty() {
            return Ok(Settings::default());
        }

        serde_json::from_str(&raw).map_err(|source| SettingsError::Serialization {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| self.io_err(e))?;
        }

        let json =
            serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Serialization {
                path: self.path.clone(),
                source,
            })?;
        fs::write(&self.path, json).await.map_err(|e| self.io_err(e))?;
        tracing::debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::records::{Record, Table};

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("settings.json"));
        let settings = store.load().await.unwrap();
        assert_eq!(settings.subject, crate::config::DEFAULT_SUBJECT);
    }

    #[tokio::test]
    async fn save_then_load_keeps_edits() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/settings.json"));

        let mut settings = Settings::default();
        settings.set_subject("Round 3");
        settings.set_sendgrid_key("SG.saved");
        settings.set_teams(
            Path::new("teams.csv"),
            Table::from_records(vec![Record::new().with("Team", "Lions")]),
        );
        store.save(&settings).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.subject, "Round 3");
        assert!(loaded.has_api_key());
        assert_eq!(loaded.team_data.len(), 1);
        assert_eq!(loaded.team_file.as_deref(), Some(Path::new("teams.csv")));
    }

    #[tokio::test]
    async fn partial_file_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"roundNumber": "5", "legacyField": true}"#).unwrap();

        let loaded = JsonFileStore::new(&path).load().await.unwrap();
        assert_eq!(loaded.round_number, "5");
        assert_eq!(loaded.from, crate::config::DEFAULT_FROM);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, SettingsError::Serialization { .. }));
    }
}
