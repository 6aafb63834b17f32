//! Pattern table — the static rule set driving the content rewriter.
//!
//! Three kinds of entries:
//! - matchers: case-insensitive patterns that flag a payload as sycophantic
//! - softeners: direct phrase replacements applied to flagged payloads
//! - injections: a fixed rotation of appended hedging phrases, plus one
//!   closing rhetorical question and one challenge sentence
//!
//! The table is immutable configuration built once and shared read-only
//! across concurrent streams. No hidden global state.

use regex::{Regex, RegexSet};

/// Immutable matcher/replacement rules consumed by the rewriter.
#[derive(Debug)]
pub struct PatternTable {
    /// Flagging patterns, evaluated as one set.
    matchers: RegexSet,
    /// Deterministic phrase softenings, applied in order.
    softeners: Vec<(Regex, &'static str)>,
    /// Appended hedge phrases, drawn in fixed rotation.
    injections: Vec<&'static str>,
    /// Closing rhetorical question appended after an injection phrase.
    closing_question: &'static str,
    /// Challenge sentence appended to long, unqualified non-flagged payloads.
    /// Contains "However" so a rewritten payload never re-triggers the rule.
    challenge: &'static str,
}

/// Flagging patterns: phrasing that signals reflexive agreement or flattery.
const MATCHERS: &[&str] = &[
    r"(?i)you'?re absolutely right",
    r"(?i)you'?re (so|completely|totally) right",
    r"(?i)what a (great|fantastic|wonderful|brilliant) (question|idea|point)",
    r"(?i)great question",
    r"(?i)excellent (question|point|idea)",
    r"(?i)that'?s a (great|fantastic|excellent|brilliant)",
    r"(?i)couldn'?t agree more",
    r"(?i)i completely agree",
    r"(?i)brilliant insight",
    r"(?i)perfect!",
    r"(?i)amazing (question|insight|observation)",
];

/// Direct softening replacements. Matching is case-insensitive; the
/// replacement text deliberately reframes rather than negates.
const SOFTENERS: &[(&str, &str)] = &[
    (
        r"(?i)you'?re absolutely right",
        "that's an interesting perspective",
    ),
    (
        r"(?i)you'?re (?:so|completely|totally) right",
        "there is something to that",
    ),
    (r"(?i)great question[.!]?", "let's examine this question."),
    (r"(?i)excellent point[.!]?", "that point deserves scrutiny."),
    (
        r"(?i)what a (?:great|fantastic|wonderful|brilliant) (question|idea|point)",
        "an answerable $1",
    ),
    (r"(?i)couldn'?t agree more", "there are several angles here"),
    (r"(?i)i completely agree", "partly, yes"),
    (r"(?i)perfect!", "workable."),
];

const INJECTIONS: &[&str] = &[
    "That said, the opposite case is worth a look.",
    "Still, a skeptic would push back here.",
    "Bear in mind this rests on assumptions worth testing.",
    "Though the evidence on this is less settled than it sounds.",
];

const CLOSING_QUESTION: &str = "What would it take to change your mind?";

const CHALLENGE: &str =
    " However, it is worth asking whether the opposite could also be true.";

impl PatternTable {
    /// Build the standard table. Pattern literals are compile-time constants;
    /// an invalid one is a programming error caught by the constructor test.
    pub fn standard() -> Result<Self, regex::Error> {
        let matchers = RegexSet::new(MATCHERS)?;
        let softeners = SOFTENERS
            .iter()
            .map(|(pat, rep)| Regex::new(pat).map(|re| (re, *rep)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            matchers,
            softeners,
            injections: INJECTIONS.to_vec(),
            closing_question: CLOSING_QUESTION,
            challenge: CHALLENGE,
        })
    }

    /// Whether the payload matches any flagging pattern.
    pub fn is_flagged(&self, payload: &str) -> bool {
        self.matchers.is_match(payload)
    }

    /// Apply every softening replacement to the payload.
    pub fn soften(&self, payload: &str) -> String {
        let mut out = payload.to_string();
        for (re, replacement) in &self.softeners {
            if re.is_match(&out) {
                out = re.replace_all(&out, *replacement).into_owned();
            }
        }
        out
    }

    /// The injection phrase at rotation position `cursor`, plus the closing
    /// rhetorical question.
    pub fn injection(&self, cursor: usize) -> String {
        let phrase = self.injections[cursor % self.injections.len()];
        format!(" {} {}", phrase, self.closing_question)
    }

    /// Number of phrases in the injection rotation.
    pub fn injection_count(&self) -> usize {
        self.injections.len()
    }

    /// The fixed challenge sentence.
    pub fn challenge(&self) -> &str {
        self.challenge
    }
}
