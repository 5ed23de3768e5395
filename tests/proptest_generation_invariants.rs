//! Property-based invariants for generated strings.
//!
//! 1. Valid output full-matches its own pattern.
//! 2. Valid output is accepted by the `regex` crate, anchored at both ends.
//! 3. Output of a satisfiable `\i` pattern never full-matches, by either matcher.
//! 4. Determinism: the same seed always yields the same string.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use regex::Regex;
use regex_gen::{GenConfig, Pattern};

// ── Helpers ─────────────────────────────────────────────────────────────

/// Patterns both this crate and the `regex` crate read the same way.
const SHARED_PATTERNS: &[&str] = &[
    "[a-z]{3,5}",
    "\\d{8}(-\\d{4}){3}-\\d{12}",
    "[A-Z][a-z]*( [A-Z][a-z]*)?",
    "(foo|bar|baz)+",
    "0x[0-9a-fA-F]{1,8}",
    "\\w+@\\w+\\.(com|net)",
    "ab{2,3}c?",
    "[^a-z]{4}",
    "\\s\\d?",
    "(?:[ab]|cd)*e",
    ".{0,6}",
    "[\\x41-\\x43]+\\u0044",
    "(?:x|y|z){2500}",
];

/// Marker patterns whose invalidation can always succeed.
const INVALIDATING_PATTERNS: &[&str] = &[
    "a\\ib",
    "\\i(a)b",
    "[a-z]{2}|\\i[0-9]",
    "[0-9]{3}-\\i[0-9]{4}",
    "[a-z]+@\\i[a-z]+\\.com",
    "x\\i{2,3}",
    "(\\d{2})-\\i\\d\\1",
    "(?<k>[a-c])\\i[d-f]\\k<k>",
    "(?:x|y|z){2500}-\\i[0-9]",
];

/// The pattern with every marker removed, anchored for the `regex` crate.
/// `None` when it uses backreferences, which that crate does not support.
fn oracle_for(source: &str) -> Option<Regex> {
    if source.contains("\\k") || source.contains("\\1") {
        return None;
    }
    let unmarked = source.replace("\\i", "");
    Some(Regex::new(&format!("^(?:{})$", unmarked)).unwrap())
}

fn sample(pattern: &Pattern, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    pattern
        .generate(&mut rng, &GenConfig::default())
        .expect("generation failed")
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Valid output matches, by both matchers
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn valid_output_matches(
        source in prop::sample::select(SHARED_PATTERNS),
        seed in any::<u64>(),
    ) {
        let pattern = Pattern::compile(source).unwrap();
        let s = sample(&pattern, seed);
        prop_assert!(pattern.is_full_match(&s), "{} produced {:?}", source, s);

        let oracle = Regex::new(&format!("^(?:{})$", source)).unwrap();
        prop_assert!(oracle.is_match(&s), "regex rejects {:?} for {}", s, source);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Invalid output does not match
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn invalid_output_does_not_match(
        source in prop::sample::select(INVALIDATING_PATTERNS),
        seed in any::<u64>(),
    ) {
        let pattern = Pattern::compile(source).unwrap();
        prop_assert!(pattern.is_invalidating());
        let s = sample(&pattern, seed);
        prop_assert!(!pattern.is_full_match(&s), "{} produced {:?}", source, s);

        if let Some(oracle) = oracle_for(source) {
            prop_assert!(!oracle.is_match(&s), "regex accepts {:?} for {}", s, source);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn same_seed_same_string(
        source in prop::sample::select(SHARED_PATTERNS),
        seed in any::<u64>(),
    ) {
        let pattern = Pattern::compile(source).unwrap();
        prop_assert_eq!(sample(&pattern, seed), sample(&pattern, seed));
    }
}
