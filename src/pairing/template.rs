//! `{{Dotted.Path}}` placeholder expansion.
//!
//! Placeholders resolve against a flattened view of `{Round, AFF, NEG}`:
//! `Round`, `AFF.<column>` and `NEG.<column>`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Pairing;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").unwrap());

/// Key under which the round number is exposed to templates.
pub const ROUND_KEY: &str = "Round";

/// Flattened substitution mapping for a pairing.
pub type Substitutions = BTreeMap<String, String>;

/// Flatten a pairing into dotted keys.
pub fn substitutions(pairing: &Pairing<'_>) -> Substitutions {
    let mut map = Substitutions::new();
    map.insert(ROUND_KEY.to_string(), pairing.round_number.to_string());
    for (prefix, record) in [("AFF", pairing.aff), ("NEG", pairing.neg)] {
        for (field, value) in record.fields() {
            map.insert(format!("{prefix}.{field}"), value.to_string());
        }
    }
    map
}

/// Replace every known placeholder in `template`. Unknown placeholders are
/// kept verbatim so a provider-side template can still fill them.
pub fn expand(template: &str, values: &Substitutions) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Names of all placeholders used in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}
