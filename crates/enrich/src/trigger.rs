//! Trigger classifier — should this request get fresh external context?
//!
//! Pure, deterministic, case-insensitive substring match against a fixed
//! set of temporal/recency keywords. False negatives only degrade quality;
//! a false positive costs one extra retrieval call. There is deliberately
//! no NLP here.

/// Keywords that signal the user wants current information.
const RECENCY_KEYWORDS: &[&str] = &[
    "latest",
    "news",
    "today",
    "yesterday",
    "this week",
    "this month",
    "this year",
    "right now",
    "currently",
    "current",
    "recent",
    "breaking",
    "just announced",
    "just released",
    "up to date",
    "as of",
    "stock price",
    "exchange rate",
    "weather",
    "score",
    "happening",
];

/// Decide whether external context retrieval is warranted for `text`.
///
/// Always returns a boolean; no error conditions, no side effects.
pub fn should_retrieve(text: &str) -> bool {
    let lower = text.to_lowercase();
    RECENCY_KEYWORDS.iter().any(|kw| lower.contains(kw))
}
