//! Sift is the fuzzy match scoring core of an interactive fuzzy finder.
//!
//! Given a short pattern and a candidate line, it decides whether the
//! pattern occurs as an order-preserving subsequence of the line and, if
//! so, produces a score reflecting how natural the match looks to a human
//! scanning the text, plus the matched positions for highlighting. The
//! caller is expected to invoke it once per (pattern, candidate) pair and
//! rank candidates by the returned score; reading candidates, sorting and
//! rendering all live outside this crate.
//!
//! Scoring runs an affine-gap local alignment with hand-tuned bonuses for
//! word boundaries, camelCase transitions and consecutive runs, over
//! scratch memory borrowed from a reusable [`Arena`]. When the alignment
//! would not fit the arena, a linear-scan strategy with the same contract
//! takes over transparently.
//!
//! # Examples
//!
//! ```
//! use sift::fuzzy_matcher::FuzzyMatcher;
//! use sift::fuzzy_matcher::sift::SiftMatcher;
//!
//! let matcher = SiftMatcher::default();
//!
//! let (score, indices) = matcher.fuzzy_indices("src/fuzzy_matcher/mod.rs", "fzmod").unwrap();
//! assert!(score > 0);
//! assert_eq!(indices.len(), 5);
//!
//! assert_eq!(None, matcher.fuzzy_match("candidate", "xq"));
//! ```
//!
//! Matching is byte-level: case folding is ASCII and the optional accent
//! stripping covers Latin-1 only. Candidates needing full Unicode folding
//! should be normalized before being handed to the matcher, with indices
//! mapped back by the caller.

#![warn(missing_docs)]

#[macro_use]
extern crate log;

pub mod arena;
mod charset;
pub mod fuzzy_matcher;

pub use crate::arena::Arena;
pub use crate::fuzzy_matcher::{FuzzyMatcher, MatchIndices, MatchResult};

/// Case sensitivity mode for matching
#[derive(Eq, PartialEq, Debug, Copy, Clone, Default)]
pub enum CaseMatching {
    /// Case-sensitive matching
    Respect,
    /// Case-insensitive matching
    Ignore,
    /// Smart case: case-insensitive unless the pattern contains uppercase
    #[default]
    Smart,
}
