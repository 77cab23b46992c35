//! SendGrid v3 `mail/send` transport.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};

use super::{Mailer, OutboundMessage, SendReceipt};
use crate::error::MailError;

/// Default API origin.
pub const SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";

const PROVIDER: &str = "sendgrid";

/// Sends messages through SendGrid's HTTP API.
pub struct SendGridMailer {
    api_key: SecretString,
    base_url: String,
    client: reqwest::Client,
}

impl SendGridMailer {
    pub fn new(api_key: SecretString) -> Self {
        Self::with_base_url(api_key, SENDGRID_BASE_URL)
    }

    /// Point the mailer at a different origin (tests, regional endpoints).
    pub fn with_base_url(api_key: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self) -> String {
        format!("{}/v3/mail/send", self.base_url)
    }
}

/// Build the JSON request body for a message.
///
/// All recipients share one personalization. Legacy templates get
/// `{{key}}`-wrapped substitutions; dynamic templates (`d-` ids) get the same
/// data nested by dotted path as `dynamic_template_data`.
pub fn build_payload(message: &OutboundMessage) -> Value {
    let to: Vec<Value> = message.to.iter().map(|email| json!({ "email": email })).collect();

    let mut personalization = Map::new();
    personalization.insert("to".into(), Value::Array(to));

    let dynamic = message
        .template_id
        .as_deref()
        .is_some_and(|id| id.starts_with("d-"));

    if !message.substitutions.is_empty() {
        if dynamic {
            personalization.insert(
                "dynamic_template_data".into(),
                nest_dotted(&message.substitutions),
            );
        } else {
            let wrapped: Map<String, Value> = message
                .substitutions
                .iter()
                .map(|(k, v)| (format!("{{{{{k}}}}}"), Value::String(v.clone())))
                .collect();
            personalization.insert("substitutions".into(), Value::Object(wrapped));
        }
    }

    let mut body = json!({
        "personalizations": [Value::Object(personalization)],
        "from": { "email": message.from },
        "subject": message.subject,
        "content": [{ "type": "text/html", "value": message.html }],
    });

    if let Some(id) = &message.template_id {
        body["template_id"] = Value::String(id.clone());
    }
    body
}

/// `{"AFF.Team": "x"}` → `{"AFF": {"Team": "x"}}`. Keys without a dot stay flat.
fn nest_dotted<'a, I>(flat: I) -> Value
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut root = Map::new();
    for (key, value) in flat {
        match key.split_once('.') {
            Some((head, rest)) => {
                let entry = root
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(inner) = entry {
                    inner.insert(rest.to_string(), Value::String(value.clone()));
                }
            }
            None => {
                root.insert(key.clone(), Value::String(value.clone()));
            }
        }
    }
    Value::Object(root)
}

/// Pull a readable reason out of a SendGrid error body.
fn error_reason(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            let messages: Vec<String> = v
                .get("errors")?
                .as_array()?
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str).map(str::to_string))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl Mailer for SendGridMailer {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, MailError> {
        let resp = self
            .client
            .post(self.api_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&build_payload(message))
            .send()
            .await
            .map_err(|e| MailError::Request {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status.is_success() {
            let message_id = resp
                .headers()
                .get("x-message-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            tracing::debug!(
                status = status.as_u16(),
                message_id = message_id.as_deref().unwrap_or("-"),
                recipients = message.to.len(),
                "SendGrid accepted message"
            );
            return Ok(SendReceipt::new(status.as_u16(), message_id));
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(status = ?status, "SendGrid rejected message");
        Err(match status {
            StatusCode::UNAUTHORIZED => MailError::Unauthorized,
            StatusCode::NOT_FOUND => MailError::NotFound,
            _ => MailError::Rejected {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                reason: error_reason(&body),
            },
        })
    }
}
