//! In-memory settings store. Round-trips through JSON like the file store.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::SettingsStore;
use crate::config::Settings;
use crate::error::SettingsError;

#[derive(Default)]
pub struct MemoryStore {
    json: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON of the last save, if any.
    pub async fn snapshot(&self) -> Option<String> {
        self.json.lock().await.clone()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self) -> Result<Settings, SettingsError> {
        match self.json.lock().await.as_deref() {
            Some(raw) => serde_json::from_str(raw).map_err(|source| SettingsError::Serialization {
                path: "<memory>".into(),
                source,
            }),
            None => Ok(Settings::default()),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let raw = serde_json::to_string(settings).map_err(|source| SettingsError::Serialization {
            path: "<memory>".into(),
            source,
        })?;
        *self.json.lock().await = Some(raw);
        Ok(())
    }
}
