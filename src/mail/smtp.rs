//! SMTP relay transport via lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use super::{Mailer, OutboundMessage, SendReceipt};
use crate::error::MailError;

const PROVIDER: &str = "smtp";

/// SMTP relay configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `SMTP_HOST` is not set.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;

        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = SecretString::from(std::env::var("SMTP_PASSWORD").unwrap_or_default());

        Some(Self {
            host,
            port,
            username,
            password,
        })
    }
}

/// Sends messages through an SMTP relay. All recipients go in `To`.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_transport(&self) -> Result<SmtpTransport, MailError> {
        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().to_string(),
        );
        Ok(SmtpTransport::relay(&self.config.host)
            .map_err(|e| MailError::Request {
                provider: PROVIDER.into(),
                reason: format!("SMTP relay error: {e}"),
            })?
            .port(self.config.port)
            .credentials(creds)
            .build())
    }
}

/// Convert an outbound message into a MIME message.
pub fn build_message(message: &OutboundMessage) -> Result<Message, MailError> {
    let parse = |addr: &str| -> Result<Mailbox, MailError> {
        addr.parse()
            .map_err(|e| MailError::Build(format!("Invalid address {addr}: {e}")))
    };

    let mut builder = Message::builder()
        .from(parse(&message.from)?)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_HTML);
    for to in &message.to {
        builder = builder.to(parse(to)?);
    }

    builder
        .body(message.html.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, MailError> {
        let email = build_message(message)?;
        let transport = self.build_transport()?;

        // lettre's SmtpTransport is blocking.
        let response = tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| MailError::Request {
                provider: PROVIDER.into(),
                reason: format!("SMTP task panicked: {e}"),
            })?
            .map_err(|e| MailError::Request {
                provider: PROVIDER.into(),
                reason: format!("SMTP send failed: {e}"),
            })?;

        let status = response.code().to_string().parse().unwrap_or(250);
        tracing::info!(recipients = message.to.len(), "Email sent via SMTP");
        Ok(SendReceipt::new(status, None))
    }
}
