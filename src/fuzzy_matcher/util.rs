//! Test helpers shared by the matcher test suites.
#![cfg(test)]

use crate::fuzzy_matcher::FuzzyMatcher;

/// Renders a choice with every matched byte wrapped in brackets, e.g.
/// `wrap_matches("axbycz", &[0, 2, 4])` → `"[a]x[b]y[c]z"`.
pub(crate) fn wrap_matches(choice: &str, indices: &[usize]) -> String {
    let mut out = String::with_capacity(choice.len() + 2 * indices.len());
    for (i, ch) in choice.char_indices() {
        if indices.contains(&i) {
            out.push('[');
            out.push(ch);
            out.push(']');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Asserts that `choices` are listed from best to strictly worse for
/// `pattern` under the given matcher.
pub(crate) fn assert_order(matcher: &dyn FuzzyMatcher, pattern: &str, choices: &[&str]) {
    for pair in choices.windows(2) {
        let better = matcher
            .fuzzy_match(pair[0], pattern)
            .unwrap_or_else(|| panic!("{:?} should match {:?}", pair[0], pattern));
        let worse = matcher
            .fuzzy_match(pair[1], pattern)
            .unwrap_or_else(|| panic!("{:?} should match {:?}", pair[1], pattern));
        assert!(
            better > worse,
            "expected {:?} ({better}) to rank above {:?} ({worse}) for {pattern:?}",
            pair[0],
            pair[1],
        );
    }
}
