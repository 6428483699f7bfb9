//! Log Redaction Layer
//!
//! Scrubs API keys, bearer tokens, and credential assignments from strings
//! prior to logging. Diffs and file paths written by the model can carry
//! these verbatim.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9_\-]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});
static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(password|passwd|secret|token|api[_-]?key)(\s*[=:]\s*)[^\s"',]+"#).unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    ASSIGNMENT_RE
        .replace_all(&redacted, "${1}${2}[REDACTED]")
        .into_owned()
}
