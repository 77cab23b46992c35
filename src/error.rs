//! Error types for the pairing mailer.

use std::path::PathBuf;

use crate::pairing::Side;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    Round(#[from] RoundError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),
}

/// Problems with the settings that prevent a submission.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown settings field: {0}")]
    UnknownField(String),
}

/// Failures while opening a tabular file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I had trouble opening {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I had trouble parsing {path}. It might not be a valid CSV: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error(
        "{path} is not formatted correctly. Make sure it contains this column (case-sensitive): \"{column}\""
    )]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path} is empty")]
    Empty { path: PathBuf },
}

/// Failure of a single round's send attempt.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    #[error("Could not find {side} team {name}. Make sure they match in the round and team file.")]
    UnresolvedTeam { side: Side, name: String },

    #[error("I did not find email addresses for {aff} and {neg}. Add some then try again.")]
    NoEmails { aff: String, neg: String },

    #[error(
        "The subject for {aff} vs {neg} is {length} characters long. It must be fewer than {limit} characters long. Please shorten it."
    )]
    SubjectTooLong {
        aff: String,
        neg: String,
        length: usize,
        limit: usize,
    },

    #[error(transparent)]
    Send(#[from] MailError),
}

/// Errors from the outbound email API.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SendGrid rejected your request. Make sure you are using a valid API key.")]
    Unauthorized,

    #[error(
        "SendGrid's server could not be found. Check if their servers are down for maintenance."
    )]
    NotFound,

    #[error("Provider {provider} rejected the message ({status}): {reason}")]
    Rejected {
        provider: String,
        status: u16,
        reason: String,
    },

    #[error("Provider {provider} request failed: {reason}")]
    Request { provider: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),
}

/// Settings persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is not valid JSON: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
