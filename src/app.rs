//! Application facade: loads and persists settings, opens the two tables,
//! and drives a submission through the dispatch lifecycle.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

use crate::config::{RuntimeConfig, Settings, SettingsField, Transport};
use crate::dispatch::{self, DispatchReport, DispatchStatus};
use crate::error::{ConfigError, Error, SettingsError};
use crate::mail::{Mailer, OutboundMessage, SendGridMailer, SmtpConfig, SmtpMailer};
use crate::records;

/// Outcome of a finished submission.
#[derive(Debug)]
pub struct SubmitSummary {
    pub report: DispatchReport,
}

impl SubmitSummary {
    pub fn is_success(&self) -> bool {
        self.report.is_success()
    }

    /// Rooms whose message was accepted.
    pub fn rooms_sent(&self) -> usize {
        self.report.succeeded().count()
    }

    pub fn participants(&self) -> usize {
        self.report.participants()
    }

    /// One-line message for the user.
    pub fn banner(&self) -> String {
        match self.report.first_error() {
            None => format!(
                "I sent {} emails to {} participants. Check your SendGrid dashboard for more details.",
                self.rooms_sent(),
                self.participants()
            ),
            Some(e) => format!("I had a problem: {e}"),
        }
    }
}

/// Build the configured mailer. The SendGrid key from the environment wins
/// over the stored one.
pub fn mailer_for(
    runtime: &RuntimeConfig,
    settings: &Settings,
) -> Result<Box<dyn Mailer>, ConfigError> {
    match runtime.transport {
        Transport::SendGrid => {
            let key = runtime
                .api_key_override
                .clone()
                .or_else(|| settings.has_api_key().then(|| settings.sendgrid_key.clone()))
                .filter(|k: &SecretString| !k.expose_secret().is_empty())
                .ok_or_else(|| ConfigError::MissingRequired {
                    key: SettingsField::SendgridKey.to_string(),
                    hint: "I won't be able to send email without it.".into(),
                })?;
            Ok(Box::new(SendGridMailer::with_base_url(
                key,
                runtime.sendgrid_base_url.clone(),
            )))
        }
        Transport::Smtp => {
            let config = SmtpConfig::from_env()
                .ok_or_else(|| ConfigError::MissingEnvVar("SMTP_HOST".into()))?;
            Ok(Box::new(SmtpMailer::new(config)))
        }
    }
}

/// The application state behind the CLI.
pub struct App<S> {
    store: S,
    settings: Settings,
    status: DispatchStatus,
}

impl<S: crate::store::SettingsStore> App<S> {
    /// Restore settings from `store`, falling back to defaults.
    pub async fn open(store: S) -> Result<Self, SettingsError> {
        let settings = store.load().await?;
        if !settings.has_api_key() {
            tracing::warn!("No SendGrid API key stored. Set one with `settings set sendgridKey <key>`.");
        }
        Ok(Self {
            store,
            settings,
            status: DispatchStatus::Idle,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn status(&self) -> DispatchStatus {
        self.status
    }

    fn transition(&mut self, to: DispatchStatus) {
        if !self.status.can_transition_to(to) {
            tracing::debug!(from = %self.status, %to, "Unexpected status transition");
        }
        self.status = to;
    }

    async fn persist(&self) -> Result<(), SettingsError> {
        self.store.save(&self.settings).await
    }

    /// Load the team file, replacing the current roster.
    pub async fn open_team_file(&mut self, path: &Path) -> Result<usize, Error> {
        let table = records::load_teams(path)
            .await
            .inspect_err(|e| tracing::error!("{e}"))?;
        let count = table.len();
        self.settings.set_teams(path, table);
        self.transition(DispatchStatus::Idle);
        self.persist().await?;
        Ok(count)
    }

    /// Load the round file, replacing the current pairings.
    pub async fn open_round_file(&mut self, path: &Path) -> Result<usize, Error> {
        let table = records::load_rounds(path)
            .await
            .inspect_err(|e| tracing::error!("{e}"))?;
        let count = table.len();
        self.settings.set_rounds(path, table);
        self.transition(DispatchStatus::Idle);
        self.persist().await?;
        Ok(count)
    }

    /// Change one setting and persist.
    pub async fn update(&mut self, field: SettingsField, value: impl Into<String>) -> Result<(), Error> {
        self.settings.set(field, value);
        self.persist().await?;
        Ok(())
    }

    /// Restore every setting to its default, tables and API key included.
    pub async fn reset(&mut self) -> Result<(), Error> {
        self.settings = Settings::default();
        self.transition(DispatchStatus::Idle);
        self.persist().await?;
        tracing::info!("Settings reset to defaults");
        Ok(())
    }

    /// Compose every round without sending.
    pub fn preview(&self) -> Vec<Result<OutboundMessage, crate::error::RoundError>> {
        dispatch::preview(
            &self.settings.round_data,
            &self.settings.team_data,
            &self.settings.template(),
            &self.settings.round_number,
        )
    }

    /// Send one message per round and wait for all of them.
    ///
    /// Configuration problems are reported before anything is sent and
    /// leave the status untouched. Taking `&mut self` rules out a second
    /// submission while one is in flight.
    pub async fn submit(&mut self, mailer: &dyn Mailer) -> Result<SubmitSummary, Error> {
        self.settings
            .validate()
            .inspect_err(|e| tracing::error!("Cannot submit: {e}"))?;

        self.transition(DispatchStatus::Loading);
        let template = self.settings.template();
        let report = dispatch::dispatch(
            &self.settings.round_data,
            &self.settings.team_data,
            &template,
            &self.settings.round_number,
            mailer,
        )
        .await;

        if report.is_success() {
            self.transition(DispatchStatus::Success);
        } else {
            self.transition(DispatchStatus::Error);
            if let Some(e) = report.first_error() {
                tracing::error!(
                    submission = %report.submission_id,
                    failed = report.failed().count(),
                    "Submission failed: {e}"
                );
            }
        }

        Ok(SubmitSummary { report })
    }
}
