//! Configuration types.
//!
//! [`Settings`] is the persisted, user-editable state. [`RuntimeConfig`] is
//! process-level configuration read from the environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;
use crate::pairing::{MessageTemplate, is_email, template};
use crate::records::Table;

/// SendGrid refuses subjects of 78 characters or more.
pub const MAX_SUBJECT_LEN: usize = 78;

pub const DEFAULT_FROM: &str = "ziggyonlinedebate@gmail.com";
pub const DEFAULT_SUBJECT: &str = "Ziggy Debate - Postings";
pub const DEFAULT_BODY: &str = "Hello,

Your debate round {{Round}} pairing is as follows:

Affirmative **{{AFF.Team}}** vs. Negative **{{NEG.Team}}**
";

/// Persisted application settings.
///
/// Unknown keys are ignored and missing keys fall back to the defaults, so
/// older settings files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    #[serde(serialize_with = "expose_key", deserialize_with = "secret_key")]
    pub sendgrid_key: SecretString,
    pub from: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
    pub round_number: String,
    pub team_file: Option<PathBuf>,
    pub team_data: Table,
    pub round_file: Option<PathBuf>,
    pub round_data: Table,
    pub template_id: String,
}

fn expose_key<S: Serializer>(key: &SecretString, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(key.expose_secret())
}

fn secret_key<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    String::deserialize(d).map(SecretString::from)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sendgrid_key: SecretString::from(String::new()),
            from: DEFAULT_FROM.to_string(),
            reply_to: DEFAULT_FROM.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            body: DEFAULT_BODY.to_string(),
            round_number: "1".to_string(),
            team_file: None,
            team_data: Table::default(),
            round_file: None,
            round_data: Table::default(),
            template_id: String::new(),
        }
    }
}

/// A user-editable scalar setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    SendgridKey,
    From,
    ReplyTo,
    Subject,
    Body,
    RoundNumber,
    TemplateId,
}

impl SettingsField {
    pub const ALL: [SettingsField; 7] = [
        Self::SendgridKey,
        Self::From,
        Self::ReplyTo,
        Self::Subject,
        Self::Body,
        Self::RoundNumber,
        Self::TemplateId,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::SendgridKey => "sendgridKey",
            Self::From => "from",
            Self::ReplyTo => "replyTo",
            Self::Subject => "subject",
            Self::Body => "body",
            Self::RoundNumber => "roundNumber",
            Self::TemplateId => "templateId",
        }
    }
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

impl FromStr for SettingsField {
    type Err = ConfigError;

    /// Accepts the camelCase key or a kebab/snake spelling (`reply-to`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.key().to_lowercase() == normalized)
            .ok_or_else(|| ConfigError::UnknownField(s.to_string()))
    }
}

impl Settings {
    pub fn set_sendgrid_key(&mut self, key: impl Into<String>) {
        self.sendgrid_key = SecretString::from(key.into());
    }

    pub fn set_from(&mut self, from: impl Into<String>) {
        self.from = from.into();
    }

    pub fn set_reply_to(&mut self, reply_to: impl Into<String>) {
        self.reply_to = reply_to.into();
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = subject.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn set_round_number(&mut self, round_number: impl Into<String>) {
        self.round_number = round_number.into();
    }

    pub fn set_template_id(&mut self, template_id: impl Into<String>) {
        self.template_id = template_id.into();
    }

    /// Replace the team table and remember where it came from.
    pub fn set_teams(&mut self, path: &Path, table: Table) {
        self.team_file = Some(path.to_path_buf());
        self.team_data = table;
    }

    /// Replace the round table and remember where it came from.
    pub fn set_rounds(&mut self, path: &Path, table: Table) {
        self.round_file = Some(path.to_path_buf());
        self.round_data = table;
    }

    /// Set one scalar field by name.
    pub fn set(&mut self, field: SettingsField, value: impl Into<String>) {
        match field {
            SettingsField::SendgridKey => self.set_sendgrid_key(value),
            SettingsField::From => self.set_from(value),
            SettingsField::ReplyTo => self.set_reply_to(value),
            SettingsField::Subject => self.set_subject(value),
            SettingsField::Body => self.set_body(value),
            SettingsField::RoundNumber => self.set_round_number(value),
            SettingsField::TemplateId => self.set_template_id(value),
        }
    }

    /// Read one scalar field. The API key is redacted.
    pub fn get(&self, field: SettingsField) -> String {
        match field {
            SettingsField::SendgridKey => {
                if self.has_api_key() {
                    "********".to_string()
                } else {
                    String::new()
                }
            }
            SettingsField::From => self.from.clone(),
            SettingsField::ReplyTo => self.reply_to.clone(),
            SettingsField::Subject => self.subject.clone(),
            SettingsField::Body => self.body.clone(),
            SettingsField::RoundNumber => self.round_number.clone(),
            SettingsField::TemplateId => self.template_id.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.sendgrid_key.expose_secret().is_empty()
    }

    /// An API key is set and both tables hold records.
    pub fn can_submit(&self) -> bool {
        self.has_api_key() && !self.round_data.is_empty() && !self.team_data.is_empty()
    }

    /// Check the message fields and tables a submission needs, reporting
    /// the first problem. The API key is checked when the mailer is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.team_data.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "teamFile".into(),
                hint: "Open a team file first.".into(),
            });
        }
        if self.round_data.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "roundFile".into(),
                hint: "Open a round file first.".into(),
            });
        }
        if self.from.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: SettingsField::From.to_string(),
                hint: "There is no \"From\" address. Please specify one.".into(),
            });
        }
        if !is_email(&self.from) {
            return Err(ConfigError::InvalidValue {
                key: SettingsField::From.to_string(),
                message: format!("{} is not an email address", self.from),
            });
        }
        if self.subject.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: SettingsField::Subject.to_string(),
                hint: "The subject is empty. Please write a subject line.".into(),
            });
        }
        // Templated subjects are checked per round once expanded.
        if template::placeholders(&self.subject).is_empty()
            && self.subject.chars().count() >= MAX_SUBJECT_LEN
        {
            return Err(ConfigError::InvalidValue {
                key: SettingsField::Subject.to_string(),
                message: format!(
                    "The subject must be fewer than {MAX_SUBJECT_LEN} characters long. Please shorten it."
                ),
            });
        }
        if self.round_number.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: SettingsField::RoundNumber.to_string(),
                hint: "There is no round number. Please specify one.".into(),
            });
        }
        Ok(())
    }

    /// The per-submission message template.
    pub fn template(&self) -> MessageTemplate {
        MessageTemplate {
            from: self.from.clone(),
            reply_to: Some(self.reply_to.clone()).filter(|r| !r.is_empty()),
            subject: self.subject.clone(),
            body: self.body.clone(),
            template_id: Some(self.template_id.clone()).filter(|id| !id.is_empty()),
        }
    }
}

/// Which outbound transport to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transport {
    #[default]
    SendGrid,
    Smtp,
}

/// Process-level configuration from environment variables.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Where settings are persisted.
    pub settings_path: PathBuf,
    /// Directory for `error.log`.
    pub log_dir: PathBuf,
    /// Overrides the stored key when set.
    pub api_key_override: Option<SecretString>,
    pub sendgrid_base_url: String,
    pub transport: Transport,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let app_dir = PathBuf::from(home).join(".pairing-mailer");

        let settings_path = std::env::var("PAIRING_MAILER_SETTINGS")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_dir.join("settings.json"));

        let log_dir = std::env::var("PAIRING_MAILER_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_dir.clone());

        let api_key_override = std::env::var("SENDGRID_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let sendgrid_base_url = std::env::var("SENDGRID_BASE_URL")
            .unwrap_or_else(|_| crate::mail::sendgrid::SENDGRID_BASE_URL.to_string());

        let transport = match std::env::var("MAILER_TRANSPORT").as_deref() {
            Ok("smtp") => Transport::Smtp,
            _ => Transport::SendGrid,
        };

        Self {
            settings_path,
            log_dir,
            api_key_override,
            sendgrid_base_url,
            transport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Record;

    fn ready() -> Settings {
        let mut settings = Settings::default();
        settings.set_sendgrid_key("SG.test");
        settings.team_data = Table::from_records(vec![Record::new().with("Team", "Lions")]);
        settings.round_data =
            Table::from_records(vec![Record::new().with("AFF", "Lions").with("NEG", "Lions")]);
        settings
    }

    #[test]
    fn defaults_are_the_tournament_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.from, DEFAULT_FROM);
        assert_eq!(settings.reply_to, DEFAULT_FROM);
        assert_eq!(settings.round_number, "1");
        assert!(settings.body.contains("{{AFF.Team}}"));
        assert!(!settings.has_api_key());
        assert!(!settings.can_submit());
    }

    #[test]
    fn can_submit_needs_key_and_tables() {
        let mut settings = ready();
        assert!(settings.can_submit());
        settings.round_data = Table::default();
        assert!(!settings.can_submit());
    }

    #[test]
    fn validate_accepts_ready_settings() {
        assert!(ready().validate().is_ok());
    }

    #[test]
    fn validate_rejects_long_subject() {
        let mut settings = ready();
        settings.set_subject("x".repeat(MAX_SUBJECT_LEN));
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "subject"));
    }

    #[test]
    fn templated_subject_is_left_to_the_composer() {
        let mut settings = ready();
        // 79 characters as written, shorter once the names are filled in.
        settings.set_subject("Round {{Round}} pairing: {{AFF.Team}} (affirmative) vs {{NEG.Team}} (negative)!");
        assert!(settings.subject.chars().count() > MAX_SUBJECT_LEN);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_from() {
        let mut settings = ready();
        settings.set_from("not-an-address");
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
        settings.set_from("");
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    fn validate_rejects_missing_round_number() {
        let mut settings = ready();
        settings.set_round_number(" ");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn field_names_parse_in_several_spellings() {
        assert_eq!("replyTo".parse::<SettingsField>().unwrap(), SettingsField::ReplyTo);
        assert_eq!("reply-to".parse::<SettingsField>().unwrap(), SettingsField::ReplyTo);
        assert_eq!("round_number".parse::<SettingsField>().unwrap(), SettingsField::RoundNumber);
        assert!("colour".parse::<SettingsField>().is_err());
    }

    #[test]
    fn set_dispatches_to_setter() {
        let mut settings = Settings::default();
        settings.set(SettingsField::Subject, "New subject");
        settings.set(SettingsField::TemplateId, "d-1");
        assert_eq!(settings.get(SettingsField::Subject), "New subject");
        assert_eq!(settings.template().template_id.as_deref(), Some("d-1"));
    }

    #[test]
    fn api_key_is_redacted_on_get() {
        let settings = ready();
        assert_eq!(settings.get(SettingsField::SendgridKey), "********");
        assert!(!format!("{settings:?}").contains("SG.test"));
    }

    #[test]
    fn empty_optional_fields_are_dropped_from_template() {
        let mut settings = Settings::default();
        settings.set_reply_to("");
        let template = settings.template();
        assert!(template.reply_to.is_none());
        assert!(template.template_id.is_none());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"subject": "Custom", "sendgridKey": "SG.x"}"#).unwrap();
        assert_eq!(settings.subject, "Custom");
        assert_eq!(settings.from, DEFAULT_FROM);
        assert!(settings.has_api_key());
    }

    #[test]
    fn settings_json_uses_camel_case_keys() {
        let json = serde_json::to_value(ready()).unwrap();
        assert_eq!(json["sendgridKey"], "SG.test");
        assert_eq!(json["roundNumber"], "1");
        assert!(json.get("teamData").is_some());
    }
}
