//! Outbound email boundary.
//!
//! The core only depends on the [`Mailer`] trait. Two transports ship with
//! the crate: the SendGrid v3 HTTP API (default) and an SMTP relay.

pub mod sendgrid;
pub mod smtp;

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use sendgrid::SendGridMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

use crate::error::MailError;

/// A fully composed message for one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub from: String,
    /// Kept for display only. Providers do not accept a reply-to for
    /// multi-recipient sends, so transports never transmit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub to: BTreeSet<String>,
    pub subject: String,
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub substitutions: BTreeMap<String, String>,
}

/// What the provider handed back for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Transport status code (HTTP status, or SMTP reply code).
    pub status: u16,
    /// Provider-assigned message id, when one is returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub accepted_at: DateTime<Utc>,
}

impl SendReceipt {
    pub fn new(status: u16, message_id: Option<String>) -> Self {
        Self {
            status,
            message_id,
            accepted_at: Utc::now(),
        }
    }
}

/// An email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Transport name used in logs and errors.
    fn name(&self) -> &str;

    /// Send one message. No retries are attempted.
    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, MailError>;
}
