//! Keeps stack frames and internal identifiers out of user-facing text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Patterns stripped from user messages. A pattern that fails to compile is
/// skipped rather than taking the process down.
static INTERNAL_DETAIL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // JS-style stack frames: "    at handler (src/api.ts:10:4)"
        r"(?m)^\s*at\s+.*$",
        // Rust backtrace frames: "  12: csr_errors::handler::handle"
        r"(?m)^\s*\d+:\s+[\w:<>]+.*$",
        // UUIDs
        r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
        // JWTs and bearer tokens
        r"\beyJ[\w-]+\.[\w-]+\.[\w-]+",
        r"(?i)\bbearer\s+\S+",
        // Source locations: "src/foo.rs:12:3", "/var/app/index.js"
        r"[\w./\\-]*\.(?:rs|ts|tsx|js|jsx|mjs|py)(?::\d+)*",
        r"(?:/[\w.-]+){2,}",
        // Postgres/PostgREST error codes: "(SQLSTATE 23505)", "PGRST116"
        r"(?i)\(?sqlstate\s*\w+\)?",
        r"\bPGRST\d+\b",
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static WHITESPACE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\s+").ok());

/// Whether `text` contains anything that must not reach the user.
pub fn contains_internal_details(text: &str) -> bool {
    INTERNAL_DETAIL_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Strip internal details from a caller-supplied user message.
///
/// Returns `None` when nothing readable is left, in which case the category
/// default should be shown instead.
pub fn sanitize_user_message(text: &str) -> Option<String> {
    let mut cleaned = text.to_string();
    for pattern in INTERNAL_DETAIL_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }

    let collapsed = match WHITESPACE.as_ref() {
        Some(ws) => ws.replace_all(&cleaned, " ").into_owned(),
        None => cleaned,
    };
    let trimmed = collapsed
        .trim()
        .trim_end_matches([':', ',', '(', '-'])
        .trim();

    if trimmed.chars().any(char::is_alphanumeric) {
        Some(trimmed.to_string())
    } else {
        None
    }
}
