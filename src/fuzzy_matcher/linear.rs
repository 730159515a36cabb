//! Linear-scan fuzzy matching.
//!
//! The cheap alternate strategy behind [`sift`](super::sift): a greedy
//! forward pass finds the pattern as an ordered subsequence, a backward
//! pass shrinks the window to the tightest one ending at the same place,
//! and a single rescore pass over that window assigns bonuses and gap
//! penalties. Linear time, no scratch matrices, but only one candidate
//! alignment is ever considered, so scores can be worse than the full
//! alignment's.
//!
//! # Example:
//! ```
//! use sift::fuzzy_matcher::FuzzyMatcher;
//! use sift::fuzzy_matcher::linear::LinearMatcher;
//!
//! let matcher = LinearMatcher::default();
//! assert_eq!(None, matcher.fuzzy_match("abc", "abx"));
//! assert!(matcher.fuzzy_match("axbycz", "abc").is_some());
//! ```

use crate::CaseMatching;
use crate::charset::{
    BONUS_BOUNDARY, BONUS_CONSECUTIVE, BONUS_FIRST_CHAR_MULTIPLIER, CharClass, SCORE_GAP_EXTENSION,
    SCORE_GAP_START, SCORE_MATCH, Score, bonus_for, char_class_of, fold_byte, pattern_byte,
};
use crate::fuzzy_matcher::{FuzzyMatcher, MatchIndices, MatchResult, ScoreType};

/// Matches `pattern` against `text` with the linear-scan strategy.
///
/// Same contract as [`sift::fuzzy_match`](super::sift::fuzzy_match), minus
/// the arena: on a match, the result's span is `[start, end)`, the score is
/// non-negative, and `pos` (when supplied) receives one ascending index per
/// pattern byte. No match yields [`MatchResult::NONE`] and leaves `pos`
/// untouched.
pub fn fuzzy_match(
    case_sensitive: bool,
    normalization: bool,
    text: &[u8],
    pattern: &[u8],
    pos: Option<&mut MatchIndices>,
) -> MatchResult {
    let m = pattern.len();
    if m == 0 {
        return MatchResult {
            start: 0,
            end: 0,
            score: 0,
        };
    }

    // Forward pass: earliest window containing the pattern in order.
    let mut pidx = 0;
    let mut start = None;
    let mut end = None;
    for (idx, &raw) in text.iter().enumerate() {
        if fold_byte(raw, case_sensitive, normalization) == pattern_byte(pattern, pidx, case_sensitive) {
            if start.is_none() {
                start = Some(idx);
            }
            pidx += 1;
            if pidx == m {
                end = Some(idx + 1);
                break;
            }
        }
    }
    let (Some(mut start), Some(end)) = (start, end) else {
        return MatchResult::NONE;
    };

    // Backward pass: shrink the window from the left. Matching the pattern
    // in reverse from the fixed end yields the latest possible start.
    let mut pidx = m;
    for idx in (start..end).rev() {
        if fold_byte(text[idx], case_sensitive, normalization)
            == pattern_byte(pattern, pidx - 1, case_sensitive)
        {
            pidx -= 1;
            if pidx == 0 {
                start = idx;
                break;
            }
        }
    }

    let score = rescore(case_sensitive, normalization, text, pattern, start, end, pos);
    MatchResult {
        start: start as i32,
        end: end as i32,
        score,
    }
}

/// Single pass over the final window `[start, end)`: match points earn
/// [`SCORE_MATCH`] plus their context bonus, skipped bytes pay affine gap
/// penalties, and the running total saturates at zero like the alignment
/// cells do.
fn rescore(
    case_sensitive: bool,
    normalization: bool,
    text: &[u8],
    pattern: &[u8],
    start: usize,
    end: usize,
    mut pos: Option<&mut MatchIndices>,
) -> i32 {
    let m = pattern.len();
    let mut pidx = 0;
    let mut score: i32 = 0;
    let mut in_gap = false;
    let mut consecutive = 0usize;
    let mut first_bonus: Score = 0;
    let mut prev_class = match start.checked_sub(1) {
        Some(i) => char_class_of(text[i]),
        None => CharClass::NonWord,
    };

    for (idx, &raw) in text.iter().enumerate().take(end).skip(start) {
        let class = char_class_of(raw);
        let c = fold_byte(raw, case_sensitive, normalization);
        if pidx < m && c == pattern_byte(pattern, pidx, case_sensitive) {
            if let Some(pos) = pos.as_deref_mut() {
                pos.push(idx);
            }
            let mut bonus = bonus_for(prev_class, class);
            if consecutive == 0 {
                first_bonus = bonus;
            } else {
                // A chunk keeps the bonus it started with; a boundary starts
                // a fresh chunk.
                if bonus == BONUS_BOUNDARY {
                    first_bonus = bonus;
                }
                bonus = bonus.max(first_bonus).max(BONUS_CONSECUTIVE);
            }
            score += SCORE_MATCH as i32;
            score += if pidx == 0 {
                (bonus * BONUS_FIRST_CHAR_MULTIPLIER) as i32
            } else {
                bonus as i32
            };
            in_gap = false;
            consecutive += 1;
            pidx += 1;
        } else {
            let penalty = if in_gap { SCORE_GAP_EXTENSION } else { SCORE_GAP_START };
            score = (score + penalty as i32).max(0);
            in_gap = true;
            consecutive = 0;
            first_bonus = 0;
        }
        prev_class = class;
    }
    score
}

// ---------------------------------------------------------------------------
// Public matcher struct
// ---------------------------------------------------------------------------

/// Fuzzy matcher using the linear-scan algorithm directly.
///
/// Mostly useful when candidates are so long or so numerous that even the
/// arena-backed alignment is too slow; [`SiftMatcher`](super::sift::SiftMatcher)
/// already falls back to this strategy on its own when scratch memory runs
/// out.
#[derive(Debug)]
pub struct LinearMatcher {
    case: CaseMatching,
    normalization: bool,
}

impl Default for LinearMatcher {
    fn default() -> Self {
        Self {
            case: CaseMatching::Smart,
            normalization: false,
        }
    }
}

impl LinearMatcher {
    /// Sets the matcher to ignore case when matching.
    pub fn ignore_case(mut self) -> Self {
        self.case = CaseMatching::Ignore;
        self
    }

    /// Sets the matcher to use smart case (case-insensitive unless the
    /// pattern contains an uppercase letter).
    pub fn smart_case(mut self) -> Self {
        self.case = CaseMatching::Smart;
        self
    }

    /// Sets the matcher to respect case exactly.
    pub fn respect_case(mut self) -> Self {
        self.case = CaseMatching::Respect;
        self
    }

    /// Enables or disables Latin-1 accent stripping.
    pub fn normalization(mut self, normalization: bool) -> Self {
        self.normalization = normalization;
        self
    }

    fn is_case_sensitive(&self, pattern: &str) -> bool {
        match self.case {
            CaseMatching::Respect => true,
            CaseMatching::Ignore => false,
            CaseMatching::Smart => pattern.bytes().any(|b| b.is_ascii_uppercase()),
        }
    }
}

impl FuzzyMatcher for LinearMatcher {
    fn fuzzy_indices(&self, choice: &str, pattern: &str) -> Option<(ScoreType, MatchIndices)> {
        let case_sensitive = self.is_case_sensitive(pattern);
        let mut indices = MatchIndices::new();
        let res = fuzzy_match(
            case_sensitive,
            self.normalization,
            choice.as_bytes(),
            pattern.as_bytes(),
            Some(&mut indices),
        );
        res.is_match().then(|| (res.score as ScoreType, indices))
    }

    fn fuzzy_match(&self, choice: &str, pattern: &str) -> Option<ScoreType> {
        let case_sensitive = self.is_case_sensitive(pattern);
        let res = fuzzy_match(
            case_sensitive,
            self.normalization,
            choice.as_bytes(),
            pattern.as_bytes(),
            None,
        );
        res.is_match().then_some(res.score as ScoreType)
    }

    fn fuzzy_match_range(&self, choice: &str, pattern: &str) -> Option<(ScoreType, usize, usize)> {
        let case_sensitive = self.is_case_sensitive(pattern);
        let res = fuzzy_match(
            case_sensitive,
            self.normalization,
            choice.as_bytes(),
            pattern.as_bytes(),
            None,
        );
        res.is_match()
            .then_some((res.score as ScoreType, res.start as usize, res.end as usize))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[cfg_attr(coverage, coverage(off))]
mod tests {
    use super::*;
    use crate::fuzzy_matcher::util::wrap_matches;

    fn wrap_fuzzy_match(choice: &str, pattern: &str) -> Option<String> {
        let matcher = LinearMatcher::default().ignore_case();
        let (_score, indices) = matcher.fuzzy_indices(choice, pattern)?;
        Some(wrap_matches(choice, &indices))
    }

    #[test]
    fn test_no_match() {
        assert_eq!(None, LinearMatcher::default().fuzzy_match("abc", "abx"));
        assert_eq!(None, LinearMatcher::default().fuzzy_match("abc", "d"));
        assert_eq!(None, LinearMatcher::default().fuzzy_match("", "a"));
    }

    #[test]
    fn test_match_indices() {
        assert_eq!("[a]x[b]y[c]z", &wrap_fuzzy_match("axbycz", "abc").unwrap());
        assert_eq!("a[x]b[y]c[z]", &wrap_fuzzy_match("axbycz", "xyz").unwrap());
    }

    #[test]
    fn test_window_is_shrunk() {
        // The first 'a' is a worse start than the one adjacent to 'b'; the
        // backward pass must pick the tight window.
        let res = fuzzy_match(false, false, b"axxxab", b"ab", None);
        assert_eq!((res.start, res.end), (4, 6));
    }

    #[test]
    fn test_empty_pattern() {
        let res = fuzzy_match(false, false, b"anything", b"", None);
        assert_eq!((res.start, res.end, res.score), (0, 0, 0));
    }

    #[test]
    fn test_score_is_never_negative() {
        // A long inner gap cannot drag the total below zero.
        let text = format!("a{}b", "x".repeat(200));
        let res = fuzzy_match(false, false, text.as_bytes(), b"ab", None);
        assert!(res.is_match());
        assert!(res.score >= 0);
    }

    #[test]
    fn test_normalization() {
        // "café" with a Latin-1 encoded é only matches with stripping on.
        let text = [b'c', b'a', b'f', 0xE9];
        assert!(fuzzy_match(false, true, &text, b"cafe", None).is_match());
        assert!(!fuzzy_match(false, false, &text, b"cafe", None).is_match());
    }
}
