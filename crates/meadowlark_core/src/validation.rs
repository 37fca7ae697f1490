//! crates/meadowlark_core/src/validation.rs
//!
//! Syntactic validation of visitor input. No DNS or mailbox checks.

use regex::Regex;
use std::sync::LazyLock;

// Local part, then one or more dot-separated DNS labels after the first.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

/// Returns true if `s` looks like a deliverable email address.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_REGEX.is_match(s)
}

/// Masks an address for logging: the first character of the local part and
/// the domain survive, so `ada@example.com` becomes `a***@example.com`.
/// Input without an `@` is masked entirely.
pub fn redact_email(s: &str) -> String {
    match s.rsplit_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}
