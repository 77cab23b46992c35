//! Email address extraction from team records.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::records::Record;

/// Local part: dot-separated atoms or a quoted string. Domain: bracketed IPv4
/// literal or dot-separated labels ending in an alphabetic TLD.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .unwrap()
});

/// Whether the whole value is a syntactically valid email address.
pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Distinct field values of `record` that are email addresses.
pub fn extract_emails(record: &Record) -> BTreeSet<String> {
    record
        .values()
        .filter(|v| is_email(v))
        .map(str::to_string)
        .collect()
}

/// Union of the addresses found on both teams of a pairing.
pub fn extract_pair_emails(aff: &Record, neg: &Record) -> BTreeSet<String> {
    let mut emails = extract_emails(aff);
    emails.extend(extract_emails(neg));
    emails
}
