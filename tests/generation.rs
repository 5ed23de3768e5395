//! End-to-end generation through the public API.

use rand::SeedableRng;
use rand::rngs::StdRng;
use regex_gen::{BackrefMode, GenConfig, GenError, Pattern, RegexGen, generate, generate_with};

fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[test]
fn bounded_lowercase_repeat() {
    let mut rng = rng(1);
    for _ in 0..1000 {
        let s = generate("[a-z]{3,5}", &mut rng).unwrap();
        assert!((3..=5).contains(&s.len()), "{:?}", s);
        assert!(s.chars().all(|c| c.is_ascii_lowercase()), "{:?}", s);
    }
}

#[test]
fn guid_shaped_digits() {
    let mut rng = rng(2);
    for _ in 0..100 {
        let s = generate("\\d{8}(-\\d{4}){3}-\\d{12}", &mut rng).unwrap();
        assert_eq!(s.len(), 36);
        for (i, c) in s.chars().enumerate() {
            if [8, 13, 18, 23].contains(&i) {
                assert_eq!(c, '-', "{:?}", s);
            } else {
                assert!(c.is_ascii_digit(), "{:?}", s);
            }
        }
    }
}

#[test]
fn guid_macro() {
    let mut rng = rng(3);
    let s = generate("[:guid:]", &mut rng).unwrap();
    assert_eq!(s.len(), 36);
    assert!(s.chars().all(|c| c == '-' || c.is_ascii_hexdigit()));
}

#[test]
fn marker_on_literal_after_text() {
    let mut rng = rng(4);
    for _ in 0..200 {
        let s = generate("a\\ib", &mut rng).unwrap();
        let chars: Vec<char> = s.chars().collect();
        assert_eq!(chars.len(), 2);
        assert_eq!(chars[0], 'a');
        assert_ne!(chars[1], 'b');
    }
}

#[test]
fn marker_on_group() {
    let mut rng = rng(5);
    for _ in 0..200 {
        let s = generate("\\i(a)b", &mut rng).unwrap();
        let chars: Vec<char> = s.chars().collect();
        assert_eq!(chars.len(), 2);
        assert_ne!(chars[0], 'a');
        assert_eq!(chars[1], 'b');
    }
}

#[test]
fn forced_branch_that_other_branch_accepts() {
    let mut rng = rng(6);
    for _ in 0..20 {
        let err = generate("[a-z]|\\i[^a-z]", &mut rng).unwrap_err();
        assert!(matches!(err, GenError::InvalidationFailed { .. }), "{err}");
    }
}

#[test]
fn forced_branch_that_fails_overall() {
    let pattern = Pattern::compile("[a-z]{2}|\\i[0-9]").unwrap();
    let mut rng = rng(7);
    for _ in 0..200 {
        let s = pattern.generate(&mut rng, &GenConfig::default()).unwrap();
        assert_eq!(s.chars().count(), 1);
        assert!(!s.chars().all(|c| c.is_ascii_digit()));
        assert!(!pattern.is_full_match(&s));
    }
}

#[test]
fn trailing_marker_before_alternation() {
    let mut rng = rng(8);
    let err = generate("[a-z]\\i|[^a-z]", &mut rng).unwrap_err();
    assert!(matches!(err, GenError::InvalidationFailed { .. }));
}

#[test]
fn marker_on_unbounded_star_has_nothing_to_break() {
    let mut rng = rng(9);
    let err = generate("x\\i*", &mut rng).unwrap_err();
    assert_eq!(
        err,
        GenError::NoInvalidatableNode {
            pattern: "x\\i*".to_string()
        }
    );
}

#[test]
fn empty_negated_set() {
    let mut rng = rng(10);
    assert_eq!(generate("[^\\x00-\\x7F]", &mut rng), Err(GenError::EmptySet));
}

#[test]
fn syntax_errors_report_position() {
    let mut rng = rng(11);
    match generate("ab(cd", &mut rng) {
        Err(GenError::PatternSyntax { position, .. }) => assert_eq!(position, 2),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        generate("a{3,1}", &mut rng),
        Err(GenError::PatternSyntax { .. })
    ));
    assert!(matches!(
        generate("(?=a)", &mut rng),
        Err(GenError::PatternSyntax { .. })
    ));
}

#[test]
fn backreference_modes() {
    let mut rng = rng(12);
    for _ in 0..100 {
        let s = generate("(\\d{3})-\\1", &mut rng).unwrap();
        assert_eq!(s[..3], s[4..]);
    }

    let config = GenConfig::default().with_backrefs(BackrefMode::Regenerate);
    let mut differed = false;
    for _ in 0..100 {
        let s = generate_with("(\\d{3})-\\1", &mut rng, &config).unwrap();
        assert_eq!(s.len(), 7);
        differed |= s[..3] != s[4..];
    }
    assert!(differed);
}

#[test]
fn named_backreference() {
    let pattern = Pattern::compile("(?<word>[a-z]{4}) \\k<word>").unwrap();
    let mut rng = rng(13);
    for _ in 0..50 {
        let s = pattern.generate(&mut rng, &GenConfig::default()).unwrap();
        let (left, right) = s.split_once(' ').unwrap();
        assert_eq!(left, right);
        assert!(pattern.is_full_match(&s));
    }
}

#[test]
fn seeded_generators_agree() {
    let patterns = ["[A-Z][a-z]{2,8}", "\\w+@\\w+\\.(com|org)", "[0-9]{2}\\i[a-f]{3}"];
    let mut a = RegexGen::from_seed(99);
    let mut b = RegexGen::from_seed(99);
    for _ in 0..50 {
        for pattern in patterns {
            assert_eq!(a.next_string(pattern), b.next_string(pattern));
        }
    }
    assert_eq!(a.cached_patterns(), patterns.len());
}

#[test]
fn slack_bounds_unbounded_repeats() {
    let config = GenConfig::default().with_repeat_slack(3);
    let mut rng = rng(14);
    for _ in 0..200 {
        let s = generate_with("[xy]+", &mut rng, &config).unwrap();
        assert!((1..=4).contains(&s.len()), "{:?}", s);
    }
}
