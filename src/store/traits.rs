//! `SettingsStore` trait. The app only reads and writes settings through it.

use async_trait::async_trait;

use crate::config::Settings;
use crate::error::SettingsError;

/// Backend-agnostic settings persistence.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the stored settings, merged over the defaults.
    /// Returns the defaults when nothing has been stored yet.
    async fn load(&self) -> Result<Settings, SettingsError>;

    /// Replace the stored settings.
    async fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}
