//! Pairing pipeline: resolve a round's teams, extract their emails,
//! and compose the message for that room.

pub mod composer;
pub mod email;
pub mod resolver;
pub mod template;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use composer::{MessageTemplate, compose, render_markdown};
pub use email::{extract_emails, extract_pair_emails, is_email};
pub use resolver::resolve;

use crate::records::Record;

/// Which side of a debate round a team is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "AFF")]
    Affirmative,
    #[serde(rename = "NEG")]
    Negative,
}

impl Side {
    /// Column name in the round file, also the placeholder prefix.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Affirmative => crate::records::AFF_COLUMN,
            Self::Negative => crate::records::NEG_COLUMN,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A round whose two teams were both found in the team table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing<'a> {
    pub aff: &'a Record,
    pub neg: &'a Record,
    pub round_number: &'a str,
}

impl Pairing<'_> {
    pub fn aff_name(&self) -> &str {
        self.aff.get(crate::records::TEAM_COLUMN).unwrap_or_default()
    }

    pub fn neg_name(&self) -> &str {
        self.neg.get(crate::records::TEAM_COLUMN).unwrap_or_default()
    }
}
