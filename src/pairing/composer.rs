//! Message composition for a resolved pairing.

use pulldown_cmark::{Options, Parser, html};
use serde::{Deserialize, Serialize};

use super::template::{self, Substitutions};
use super::{Pairing, extract_pair_emails};
use crate::config::MAX_SUBJECT_LEN;
use crate::error::RoundError;
use crate::mail::OutboundMessage;

/// The parts of a message shared by every room in a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub from: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    pub subject: String,
    /// Markdown body with `{{Dotted.Path}}` placeholders.
    pub body: String,
    #[serde(default)]
    pub template_id: Option<String>,
}

/// Render markdown to HTML (CommonMark plus tables and strikethrough).
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Build the outbound message for one room.
///
/// Fails with [`RoundError::NoEmails`] when neither team has an address, and
/// with [`RoundError::SubjectTooLong`] when the expanded subject reaches
/// [`MAX_SUBJECT_LEN`] characters.
pub fn compose(
    pairing: &Pairing<'_>,
    template: &MessageTemplate,
) -> Result<OutboundMessage, RoundError> {
    let to = extract_pair_emails(pairing.aff, pairing.neg);
    if to.is_empty() {
        return Err(RoundError::NoEmails {
            aff: pairing.aff_name().to_string(),
            neg: pairing.neg_name().to_string(),
        });
    }

    let substitutions: Substitutions = template::substitutions(pairing);
    let subject = template::expand(&template.subject, &substitutions);
    let length = subject.chars().count();
    if length >= MAX_SUBJECT_LEN {
        return Err(RoundError::SubjectTooLong {
            aff: pairing.aff_name().to_string(),
            neg: pairing.neg_name().to_string(),
            length,
            limit: MAX_SUBJECT_LEN,
        });
    }
    let body = template::expand(&template.body, &substitutions);

    Ok(OutboundMessage {
        from: template.from.clone(),
        reply_to: template.reply_to.clone().filter(|r| !r.is_empty()),
        to,
        subject,
        html: render_markdown(&body),
        template_id: template.template_id.clone().filter(|id| !id.is_empty()),
        substitutions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Record;

    fn template() -> MessageTemplate {
        MessageTemplate {
            from: "tab@debate.org".into(),
            reply_to: Some("tab@debate.org".into()),
            subject: "Round {{Round}} postings".into(),
            body: "Hello,\n\nAffirmative **{{AFF.Team}}** vs. Negative **{{NEG.Team}}**\n".into(),
            template_id: None,
        }
    }

    #[test]
    fn renders_markdown_to_html() {
        assert_eq!(render_markdown("Hello **there**"), "<p>Hello <strong>there</strong></p>\n");
    }

    #[test]
    fn composes_expanded_html_message() {
        let aff = Record::new().with("Team", "Lions").with("Email 1", "l@x.com");
        let neg = Record::new().with("Team", "Tigers").with("Email 1", "t@x.com");
        let pairing = Pairing {
            aff: &aff,
            neg: &neg,
            round_number: "4",
        };

        let message = compose(&pairing, &template()).unwrap();
        assert_eq!(message.from, "tab@debate.org");
        assert_eq!(message.subject, "Round 4 postings");
        assert!(message.html.contains("<strong>Lions</strong>"));
        assert!(message.html.contains("<strong>Tigers</strong>"));
        assert!(message.html.starts_with("<p>Hello,</p>"));
        assert_eq!(message.to.len(), 2);
        assert_eq!(message.substitutions.get("Round").map(String::as_str), Some("4"));
        assert!(message.template_id.is_none());
    }

    #[test]
    fn recipients_are_a_union() {
        let aff = Record::new().with("Team", "Lions").with("Email 1", "not-an-email");
        let neg = Record::new().with("Team", "Tigers").with("Email 1", "t@x.com");
        let pairing = Pairing {
            aff: &aff,
            neg: &neg,
            round_number: "1",
        };
        let message = compose(&pairing, &template()).unwrap();
        assert_eq!(message.to.len(), 1);
        assert!(message.to.contains("t@x.com"));
    }

    #[test]
    fn no_emails_names_both_teams() {
        let aff = Record::new().with("Team", "Lions");
        let neg = Record::new().with("Team", "Tigers").with("Email 1", "");
        let pairing = Pairing {
            aff: &aff,
            neg: &neg,
            round_number: "1",
        };
        let err = compose(&pairing, &template()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "I did not find email addresses for Lions and Tigers. Add some then try again."
        );
    }

    #[test]
    fn subject_limit_applies_after_expansion() {
        let long_name = "A".repeat(70);
        let aff = Record::new().with("Team", long_name.as_str()).with("Email", "a@x.com");
        let neg = Record::new().with("Team", "Tigers").with("Email", "t@x.com");
        let pairing = Pairing {
            aff: &aff,
            neg: &neg,
            round_number: "1",
        };
        let tpl = MessageTemplate {
            subject: "{{AFF.Team}} vs {{NEG.Team}}".into(),
            ..template()
        };

        match compose(&pairing, &tpl).unwrap_err() {
            RoundError::SubjectTooLong { aff, neg, length, limit } => {
                assert_eq!(aff, long_name);
                assert_eq!(neg, "Tigers");
                assert_eq!(length, 80);
                assert_eq!(limit, MAX_SUBJECT_LEN);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let lions = Record::new().with("Team", "Lions").with("Email", "l@x.com");
        let short = Pairing {
            aff: &lions,
            neg: &neg,
            round_number: "1",
        };
        assert_eq!(compose(&short, &tpl).unwrap().subject, "Lions vs Tigers");
    }

    #[test]
    fn template_id_only_when_non_empty() {
        let aff = Record::new().with("Team", "Lions").with("Email", "l@x.com");
        let neg = Record::new().with("Team", "Tigers");
        let pairing = Pairing {
            aff: &aff,
            neg: &neg,
            round_number: "1",
        };

        let mut tpl = template();
        tpl.template_id = Some(String::new());
        assert!(compose(&pairing, &tpl).unwrap().template_id.is_none());

        tpl.template_id = Some("d-123".into());
        assert_eq!(
            compose(&pairing, &tpl).unwrap().template_id.as_deref(),
            Some("d-123")
        );
    }

    #[test]
    fn composing_twice_is_identical() {
        let aff = Record::new().with("Team", "Lions").with("Email", "l@x.com");
        let neg = Record::new().with("Team", "Tigers").with("Email", "t@x.com");
        let pairing = Pairing {
            aff: &aff,
            neg: &neg,
            round_number: "1",
        };
        let tpl = template();
        assert_eq!(compose(&pairing, &tpl).unwrap(), compose(&pairing, &tpl).unwrap());
    }
}
