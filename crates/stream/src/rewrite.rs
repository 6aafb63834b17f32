//! Content rewriter — the per-payload rewrite policy.
//!
//! Operates only on data-frame payloads; control frames never reach it.
//! Randomization keeps the output from feeling templated: not every flagged
//! line is softened, and unflagged lines only occasionally pick up a
//! challenge. The RNG is injected so tests can force either branch.
//!
//! Policy, in order:
//! 1. Skip payloads shorter than 10 bytes or all-whitespace.
//! 2. Flag the payload against the pattern table.
//! 3. Flagged: with p = aggressiveness/10, soften phrases; then with the
//!    secondary injection probability, append one rotating hedge phrase and
//!    a closing rhetorical question.
//! 4. Unflagged: with p = aggressiveness/divisor, append the fixed challenge
//!    sentence — but only to payloads longer than 50 bytes that contain
//!    neither a question mark nor the word "However".
//! 5. Otherwise return the payload unchanged.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::patterns::PatternTable;

/// Payloads shorter than this are never rewritten.
const MIN_REWRITE_LEN: usize = 10;
/// Unflagged payloads at or below this length are never challenged.
const CHALLENGE_MIN_LEN: usize = 50;

/// The single external tuning knob, plus the empirically tuned probability
/// constants kept configurable rather than hard-coded.
#[derive(Debug, Clone, Copy)]
pub struct RewriteConfig {
    /// 0 = never rewrite, 10 = near-always when flagged. Clamped on
    /// construction, never rejected.
    pub aggressiveness: u8,
    /// Secondary probability of appending an injection phrase after a
    /// softening pass.
    pub inject_probability: f64,
    /// Divisor for the unflagged challenge probability
    /// (p = aggressiveness / divisor).
    pub challenge_divisor: f64,
}

impl RewriteConfig {
    /// Build a config, clamping aggressiveness into 0–10.
    pub fn new(aggressiveness: i64) -> Self {
        Self {
            aggressiveness: aggressiveness.clamp(0, 10) as u8,
            ..Self::default()
        }
    }
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            aggressiveness: 5,
            inject_probability: 0.3,
            challenge_divisor: 20.0,
        }
    }
}

/// Rewrites data-frame payloads according to the pattern table and config.
///
/// Shared read-only across concurrent streams; the injection rotation cursor
/// is the only internal state and is atomic.
#[derive(Debug)]
pub struct Rewriter {
    table: PatternTable,
    config: RewriteConfig,
    injection_cursor: AtomicUsize,
}

impl Rewriter {
    pub fn new(table: PatternTable, config: RewriteConfig) -> Self {
        Self {
            table,
            config,
            injection_cursor: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Rewrite one payload with the caller's RNG.
    ///
    /// Returns the payload unchanged whenever no rule fires; there is no
    /// failure mode that blocks the stream.
    pub fn rewrite_with<R: Rng>(&self, payload: &str, rng: &mut R) -> String {
        if payload.len() < MIN_REWRITE_LEN || payload.trim().is_empty() {
            return payload.to_string();
        }

        let aggressiveness = f64::from(self.config.aggressiveness);

        if self.table.is_flagged(payload) {
            if rng.random::<f64>() < aggressiveness / 10.0 {
                let mut out = self.table.soften(payload);
                if rng.random::<f64>() < self.config.inject_probability {
                    let cursor = self.injection_cursor.fetch_add(1, Ordering::Relaxed);
                    out.push_str(&self.table.injection(cursor));
                }
                return out;
            }
        } else if payload.len() > CHALLENGE_MIN_LEN
            && !payload.contains('?')
            && !payload.contains("However")
            && rng.random::<f64>() < aggressiveness / self.config.challenge_divisor
        {
            let mut out = payload.to_string();
            out.push_str(self.table.challenge());
            return out;
        }

        payload.to_string()
    }

    /// Rewrite with a thread-local RNG (production path).
    pub fn rewrite(&self, payload: &str) -> String {
        self.rewrite_with(payload, &mut rand::rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rewriter(aggressiveness: i64) -> Rewriter {
        Rewriter::new(
            PatternTable::standard().unwrap(),
            RewriteConfig::new(aggressiveness),
        )
    }

    /// An RNG whose f64 draws come from a fixed script. Forces branch
    /// selection without relying on probability.
    fn seeded() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn aggressiveness_is_clamped() {
        assert_eq!(RewriteConfig::new(-3).aggressiveness, 0);
        assert_eq!(RewriteConfig::new(25).aggressiveness, 10);
        assert_eq!(RewriteConfig::new(7).aggressiveness, 7);
    }

    #[test]
    fn zero_aggressiveness_is_identity() {
        let rw = rewriter(0);
        let mut rng = seeded();
        for payload in [
            "You're absolutely right about that",
            "A long unqualified statement that runs well past fifty characters without hedging.",
            "Great question! Let me answer.",
        ] {
            assert_eq!(rw.rewrite_with(payload, &mut rng), payload);
        }
    }

    #[test]
    fn short_payloads_skipped() {
        let rw = rewriter(10);
        let mut rng = seeded();
        assert_eq!(rw.rewrite_with("Perfect!", &mut rng), "Perfect!");
    }

    #[test]
    fn whitespace_payloads_skipped() {
        let rw = rewriter(10);
        let mut rng = seeded();
        assert_eq!(rw.rewrite_with("            ", &mut rng), "            ");
    }

    #[test]
    fn max_aggressiveness_always_softens_flagged() {
        // p = 10/10 = 1.0: the primary branch always fires.
        let rw = rewriter(10);
        let mut rng = seeded();
        let out = rw.rewrite_with("You're absolutely right about that", &mut rng);
        assert!(out.contains("that's an interesting perspective"));
    }

    #[test]
    fn flagged_rewrite_deterministic_under_seed() {
        let rw = rewriter(10);
        let a = rw.rewrite_with("You're absolutely right about that", &mut seeded());
        let b = rw.rewrite_with("You're absolutely right about that", &mut seeded());
        // Same seed, same draws; only the rotation cursor differs, and it
        // only matters when the injection branch fired.
        if !a.contains('?') && !b.contains('?') {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn injection_appends_closing_question() {
        let rw = rewriter(10);
        // Find a seed whose second draw lands under 0.3.
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = rw.rewrite_with("You're absolutely right about that", &mut rng);
            if out.ends_with('?') {
                assert!(out.contains("that's an interesting perspective"));
                return;
            }
        }
        panic!("no seed triggered the injection branch");
    }

    #[test]
    fn challenge_appended_to_long_unflagged() {
        let rw = rewriter(10);
        let payload =
            "This statement is long, declarative, and completely free of hedging or doubt.";
        // p = 10/20 = 0.5: some seed fires the branch.
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = rw.rewrite_with(payload, &mut rng);
            if out != payload {
                assert!(out.starts_with(payload));
                assert!(out.contains("However"));
                return;
            }
        }
        panic!("no seed triggered the challenge branch");
    }

    #[test]
    fn challenge_is_idempotent() {
        let rw = rewriter(10);
        let payload =
            "This statement is long, declarative, and completely free of hedging or doubt.";
        let mut challenged = payload.to_string();
        challenged.push_str(rw.table.challenge());

        // A payload that already carries the challenge contains "However",
        // so rule 4 can never re-fire: repeated passes are stable.
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(rw.rewrite_with(&challenged, &mut rng), challenged);
        }
    }

    #[test]
    fn questions_never_challenged() {
        let rw = rewriter(10);
        let payload =
            "Would this long sentence with plenty of characters not contain a question mark?";
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(rw.rewrite_with(payload, &mut rng), payload);
        }
    }

    #[test]
    fn rotation_cursor_advances_across_injections() {
        let rw = rewriter(10);
        let mut outputs = Vec::new();
        for seed in 0..256 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = rw.rewrite_with("You're absolutely right about that", &mut rng);
            if out.ends_with('?') {
                outputs.push(out);
            }
            if outputs.len() >= 2 {
                break;
            }
        }
        assert!(outputs.len() >= 2, "expected at least two injections");
        // Consecutive injections draw different phrases from the rotation.
        assert_ne!(outputs[0], outputs[1]);
    }
}
