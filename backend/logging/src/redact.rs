//! Log Redaction Layer
//!
//! Scrubs API keys, bearer tokens, and phone numbers from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
});
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[A-Za-z0-9\-_]{20,})|(Bearer\s+[A-Za-z0-9\-\._~+/]+=*)").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    // Tokens first: a long key can contain digit runs that look like a phone number.
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    TELEPHONE_RE
        .replace_all(&redacted, "[REDACTED_PHONE]")
        .into_owned()
}
