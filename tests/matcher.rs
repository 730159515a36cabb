//! End-to-end checks of the matcher contract through the public API.

use sift::arena::Arena;
use sift::fuzzy_matcher::sift::{SiftMatcher, fuzzy_match};
use sift::fuzzy_matcher::{FuzzyMatcher, MatchIndices, MatchResult, linear};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Naive ordered-subsequence oracle, ASCII case-insensitive.
fn is_subsequence(text: &[u8], pattern: &[u8]) -> bool {
    let mut pidx = 0;
    for &c in text {
        if pidx < pattern.len() && c.to_ascii_lowercase() == pattern[pidx].to_ascii_lowercase() {
            pidx += 1;
        }
    }
    pidx == pattern.len()
}

#[test]
fn subsequence_soundness_exhaustive() {
    init();
    // Every text of length <= 5 over a tiny alphabet, against every pattern
    // of length <= 2: a match is reported exactly when the oracle says the
    // pattern is an ordered subsequence.
    let alphabet = [b'a', b'b', b'_'];
    let patterns: &[&[u8]] = &[b"a", b"b", b"ab", b"ba", b"bb", b"a_"];
    let mut arena = Arena::default();

    let mut texts: Vec<Vec<u8>> = vec![Vec::new()];
    for _ in 0..5 {
        let mut next = Vec::new();
        for t in &texts {
            for &c in &alphabet {
                let mut t = t.clone();
                t.push(c);
                next.push(t);
            }
        }
        for text in &next {
            for &pattern in patterns {
                let res = fuzzy_match(false, false, text, pattern, None, Some(&mut arena));
                assert_eq!(
                    res.is_match(),
                    is_subsequence(text, pattern),
                    "text={:?} pattern={:?}",
                    String::from_utf8_lossy(text),
                    String::from_utf8_lossy(pattern),
                );
                if !res.is_match() {
                    assert_eq!(res, MatchResult::NONE);
                }
            }
        }
        texts = next;
    }
}

#[test]
fn span_validity() {
    init();
    let corpus = [
        "src/fuzzy_matcher/mod.rs",
        "FooBarBaz",
        "a_very_long_snake_case_identifier",
        "x/y/z/deeply/nested/path/file.txt",
    ];
    let patterns = ["fm", "fbb", "velci", "zdnf", "a", "xz"];
    let mut arena = Arena::default();

    for text in corpus {
        for pattern in patterns {
            let mut pos = MatchIndices::new();
            let res = fuzzy_match(
                false,
                false,
                text.as_bytes(),
                pattern.as_bytes(),
                Some(&mut pos),
                Some(&mut arena),
            );
            if !res.is_match() {
                assert!(pos.is_empty(), "sink must stay empty on no match");
                continue;
            }
            let (start, end) = (res.start as usize, res.end as usize);
            assert!(start < end && end <= text.len());
            assert_eq!(pos.len(), pattern.len());
            assert!(pos.windows(2).all(|w| w[0] < w[1]), "indices must ascend");
            assert!(pos.iter().all(|&p| p >= start && p < end));
            assert_eq!(*pos.last().unwrap(), end - 1);
        }
    }
}

#[test]
fn determinism_and_reentrancy() {
    init();
    // One arena, reused across interleaved calls: identical inputs must
    // produce identical outputs regardless of what ran in between.
    let mut arena = Arena::default();
    let run = |arena: &mut Arena| {
        let mut pos = MatchIndices::new();
        let res = fuzzy_match(
            false,
            false,
            b"helper/item_reader.rs",
            b"hir",
            Some(&mut pos),
            Some(arena),
        );
        (res, pos)
    };
    let first = run(&mut arena);
    let _ = fuzzy_match(false, false, b"completely different text", b"cdt", None, Some(&mut arena));
    let second = run(&mut arena);
    assert_eq!(first, second);

    // A fresh arena must agree with the reused one.
    let mut fresh = Arena::default();
    assert_eq!(run(&mut fresh), first);
}

#[test]
fn boundary_preference() {
    init();
    let matcher = SiftMatcher::default();
    let after_separator = matcher.fuzzy_match("foo_bar", "b").unwrap();
    let mid_word = matcher.fuzzy_match("foobar", "b").unwrap();
    assert!(
        after_separator > mid_word,
        "separator={after_separator} mid-word={mid_word}"
    );
}

#[test]
fn gap_penalty_monotonicity() {
    init();
    let matcher = SiftMatcher::default();
    let tight = matcher.fuzzy_match("ab", "ab").unwrap();
    let one_gap = matcher.fuzzy_match("axb", "ab").unwrap();
    let two_gaps = matcher.fuzzy_match("axxb", "ab").unwrap();
    assert!(tight > one_gap && one_gap > two_gaps);
}

#[test]
fn empty_pattern_matches_trivially() {
    init();
    let mut arena = Arena::default();
    for text in ["anything", ""] {
        let res = fuzzy_match(false, false, text.as_bytes(), b"", None, Some(&mut arena));
        assert_eq!((res.start, res.end, res.score), (0, 0, 0));
    }
}

#[test]
fn single_char_fast_path() {
    init();
    // "Banana" has no boundary 'a', so the first occurrence wins with the
    // bare match score.
    let mut arena = Arena::default();
    let mut pos = MatchIndices::new();
    let res = fuzzy_match(false, false, b"Banana", b"a", Some(&mut pos), Some(&mut arena));
    assert_eq!((res.start, res.end, res.score), (1, 2, 16));
    assert_eq!(pos, [1]);
}

#[test]
fn no_match_is_the_sentinel() {
    init();
    let mut arena = Arena::default();
    let mut pos = MatchIndices::new();
    let res = fuzzy_match(false, false, b"abc", b"xyz", Some(&mut pos), Some(&mut arena));
    assert_eq!(res, MatchResult::NONE);
    assert!(pos.is_empty());
}

#[test]
fn capacity_exceeded_degrades_to_linear() {
    init();
    // An arena too small for the alignment matrix must still produce a
    // result, identical to the linear strategy's.
    let mut tiny = Arena::new(2, 2);
    let res = fuzzy_match(false, false, b"foo_bar_baz", b"fbb", None, Some(&mut tiny));
    assert_eq!(res, linear::fuzzy_match(false, false, b"foo_bar_baz", b"fbb", None));
    assert!(res.is_match());

    // Same without any arena at all.
    let res = fuzzy_match(false, false, b"foo_bar_baz", b"fbb", None, None);
    assert!(res.is_match());
}

#[test]
fn matcher_is_shareable_across_threads() {
    init();
    let matcher = SiftMatcher::default();
    let expected = matcher.fuzzy_indices("src/main.rs", "smr").unwrap();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    assert_eq!(matcher.fuzzy_indices("src/main.rs", "smr").unwrap(), expected);
                }
            });
        }
    });
}
