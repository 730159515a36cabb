//! Fuzzy matching algorithms and implementations.
//!
//! Two algorithms share one contract: [`sift`] runs an affine-gap local
//! alignment over a pre-filtered window of the text and backtracks the
//! optimal positions, while [`linear`] is the cheap single-pass strategy
//! that [`sift`] falls back to when the alignment matrix would not fit in
//! the caller's arena.

pub mod linear;
pub mod sift;
mod util;

/// Index into the scored text, in bytes.
pub type IndexType = usize;

/// Score type exposed by the [`FuzzyMatcher`] trait.
pub type ScoreType = i64;

/// Ordered collection of matched text indices, for highlighting.
pub type MatchIndices = Vec<IndexType>;

/// Outcome of scoring one candidate: the matched span and its score.
///
/// `start`/`end` delimit the half-open byte span `[start, end)` of the text
/// covered by the match. [`MatchResult::NONE`] is the no-match sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchResult {
    /// First byte of the matched span, or `-1` for no match.
    pub start: i32,
    /// One past the last matched byte, or `-1` for no match.
    pub end: i32,
    /// Match quality; higher is better. `0` for no match.
    pub score: i32,
}

impl MatchResult {
    /// The no-match sentinel.
    pub const NONE: Self = Self {
        start: -1,
        end: -1,
        score: 0,
    };

    /// Whether this result denotes a real match.
    pub fn is_match(&self) -> bool {
        self.start >= 0
    }
}

/// Trait for fuzzy matching text patterns against choices.
pub trait FuzzyMatcher: Send + Sync {
    /// Fuzzy match choice with pattern, returning the score and the matched
    /// byte indices of the choice, in ascending order.
    fn fuzzy_indices(&self, choice: &str, pattern: &str) -> Option<(ScoreType, MatchIndices)>;

    /// Fuzzy match choice with pattern, returning only the score.
    fn fuzzy_match(&self, choice: &str, pattern: &str) -> Option<ScoreType> {
        self.fuzzy_indices(choice, pattern).map(|(score, _)| score)
    }

    /// Fuzzy match and return `(score, begin, end)` without collecting all
    /// indices. `begin` is the first matched byte, `end` is one past the
    /// last. Default implementation falls back to [`Self::fuzzy_indices`].
    fn fuzzy_match_range(&self, choice: &str, pattern: &str) -> Option<(ScoreType, usize, usize)> {
        self.fuzzy_indices(choice, pattern).map(|(score, indices)| {
            let begin = indices.first().copied().unwrap_or(0);
            let end = indices.last().map(|&i| i + 1).unwrap_or(0);
            (score, begin, end)
        })
    }
}
