//! Sift fuzzy matching algorithm.
//!
//! Affine-gap local alignment (Smith-Waterman family) between a short
//! pattern and a candidate line, specialised for interactive filtering:
//!
//! - **Pre-filtered window**: a `memchr`-driven ordered-subsequence scan
//!   rejects non-matches outright and bounds all later work to the slice of
//!   the text that can actually contain a match.
//! - **Context bonuses**: matches at word boundaries, camelCase and digit
//!   transitions, and inside consecutive runs are rewarded, so the
//!   alignment prefers the positions a human scanning the line would pick.
//! - **Compacted matrix**: the score and run-length matrices span only the
//!   window between the first pattern byte's first hit and the last
//!   pattern byte's last hit, never the full text width.
//! - **Arena scratch**: all per-call buffers come from a caller-owned
//!   [`Arena`]; when the matrix would not fit, the call transparently
//!   degrades to the [`linear`] strategy with the same contract.
//!
//! # Example:
//! ```
//! use sift::fuzzy_matcher::FuzzyMatcher;
//! use sift::fuzzy_matcher::sift::SiftMatcher;
//!
//! let matcher = SiftMatcher::default();
//!
//! assert_eq!(None, matcher.fuzzy_match("abc", "abx"));
//! assert!(matcher.fuzzy_match("axbycz", "abc").is_some());
//!
//! let (_score, indices) = matcher.fuzzy_indices("axbycz", "abc").unwrap();
//! assert_eq!(indices, [0, 2, 4]);
//! ```

use std::cell::RefCell;

use memchr::{memchr, memchr2};
use thread_local::ThreadLocal;

use crate::CaseMatching;
use crate::arena::Arena;
use crate::charset::{
    BONUS_BOUNDARY, BONUS_CONSECUTIVE, BONUS_FIRST_CHAR_MULTIPLIER, CharClass, SCORE_GAP_EXTENSION,
    SCORE_GAP_START, SCORE_MATCH, Score, bonus_for, char_class_of, fold_byte, normalize,
    pattern_byte,
};
use crate::fuzzy_matcher::linear;
use crate::fuzzy_matcher::{FuzzyMatcher, MatchIndices, MatchResult, ScoreType};

// ---------------------------------------------------------------------------
// Pre-filter
// ---------------------------------------------------------------------------

/// Finds the first occurrence of `b` in `text[from..]`, folding `A-Z` onto
/// `a-z` when matching case-insensitively.
#[inline]
fn try_skip(text: &[u8], b: u8, from: usize, case_sensitive: bool) -> Option<usize> {
    let hay = &text[from..];
    let idx = if !case_sensitive && b.is_ascii_lowercase() {
        memchr2(b, b - 32, hay)
    } else {
        memchr(b, hay)
    }?;
    Some(from + idx)
}

/// Ordered-subsequence pre-filter.
///
/// Scans the text once, consuming pattern bytes in order. Returns `None`
/// when the pattern cannot occur as an ordered subsequence at all.
/// Otherwise returns the offset the alignment window starts at: one byte
/// *before* the first pattern byte's first occurrence (when there is one),
/// so the row-0 scan computes that position's bonus against its true
/// predecessor class rather than an artificial start-of-string.
fn subsequence_start(
    text: &[u8],
    pattern: &[u8],
    case_sensitive: bool,
    normalization: bool,
) -> Option<usize> {
    // memchr cannot see through accent stripping; with normalization on,
    // fall back to a plain folded scan so the filter never false-negatives.
    if normalization {
        let mut first_idx = 0;
        let mut pidx = 0;
        let mut b = pattern_byte(pattern, 0, case_sensitive);
        for (idx, &raw) in text.iter().enumerate() {
            if fold_byte(raw, case_sensitive, true) == b {
                if pidx == 0 && idx > 0 {
                    first_idx = idx - 1;
                }
                pidx += 1;
                if pidx == pattern.len() {
                    return Some(first_idx);
                }
                b = pattern_byte(pattern, pidx, case_sensitive);
            }
        }
        return None;
    }

    let mut first_idx = 0;
    let mut idx = 0;
    for (pidx, _) in pattern.iter().enumerate() {
        let b = pattern_byte(pattern, pidx, case_sensitive);
        idx = try_skip(text, b, idx, case_sensitive)?;
        if pidx == 0 && idx > 0 {
            first_idx = idx - 1;
        }
        idx += 1;
    }
    Some(first_idx)
}

// ---------------------------------------------------------------------------
// Compacted matrix
// ---------------------------------------------------------------------------

/// Row-major view over the compacted alignment window.
///
/// Logical cell `(row, col)` — `col` being an absolute text index — lives at
/// `row * width + (col - base)`, where `base` is the window's first text
/// column. Rows are only ever written from their own first-occurrence column
/// onward; reads left of that are the caller's responsibility to guard.
struct Grid<'a> {
    cells: &'a mut [Score],
    width: usize,
    base: usize,
}

impl<'a> Grid<'a> {
    fn new(cells: &'a mut [Score], width: usize, base: usize) -> Self {
        Self { cells, width, base }
    }

    #[inline(always)]
    fn get(&self, row: usize, col: usize) -> Score {
        self.cells[row * self.width + col - self.base]
    }

    #[inline(always)]
    fn set(&mut self, row: usize, col: usize, value: Score) {
        self.cells[row * self.width + col - self.base] = value;
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Matches `pattern` against `text`, scoring with the full alignment.
///
/// On a match, returns the byte span `[start, end)` and a non-negative
/// score; otherwise [`MatchResult::NONE`]. When `pos` is supplied and a
/// match is found, exactly one ascending index per pattern byte is appended
/// to it; without a sink the backtrace is skipped entirely and `start` is
/// the earliest position any optimal match could begin at.
///
/// `arena` provides the scratch memory. The alignment runs only when the
/// matrix fits the arena's fixed capacity; otherwise — and always when no
/// arena is supplied — the call is redirected to [`linear::fuzzy_match`],
/// which has the same contract but considers a single greedy alignment.
///
/// Never panics: every outcome, including an empty pattern (an immediate
/// empty match at the start of the text), is expressed through the result
/// value.
pub fn fuzzy_match(
    case_sensitive: bool,
    normalization: bool,
    text: &[u8],
    pattern: &[u8],
    mut pos: Option<&mut MatchIndices>,
    arena: Option<&mut Arena>,
) -> MatchResult {
    if pattern.is_empty() {
        return MatchResult {
            start: 0,
            end: 0,
            score: 0,
        };
    }
    let Some(arena) = arena else {
        trace!("no arena supplied, scoring with the linear strategy");
        return linear::fuzzy_match(case_sensitive, normalization, text, pattern, pos);
    };
    if text.len().saturating_mul(pattern.len()) > arena.capacity16() {
        trace!(
            "{}x{} alignment exceeds the arena, scoring with the linear strategy",
            text.len(),
            pattern.len()
        );
        return linear::fuzzy_match(case_sensitive, normalization, text, pattern, pos);
    }
    match align(case_sensitive, normalization, text, pattern, pos.as_deref_mut(), arena) {
        Some(result) => result,
        // A claim did not fit even though the matrix estimate did; same
        // degradation as the up-front capacity check.
        None => linear::fuzzy_match(case_sensitive, normalization, text, pattern, pos),
    }
}

/// Runs the windowed alignment. Returns `None` only when the arena cannot
/// hold the call's scratch buffers, in which case nothing has been written
/// to `pos`.
fn align(
    case_sensitive: bool,
    normalization: bool,
    text: &[u8],
    pattern: &[u8],
    mut pos: Option<&mut MatchIndices>,
    arena: &mut Arena,
) -> Option<MatchResult> {
    let m = pattern.len();
    let n = text.len();

    let start = match subsequence_start(text, pattern, case_sensitive, normalization) {
        Some(offset) => offset,
        None => return Some(MatchResult::NONE),
    };

    let (mut c16, mut c32) = arena.claims();
    let h0 = c16.claim(n)?;
    let c0 = c16.claim(n)?;
    let bonus = c16.claim(n)?;
    let first_occ = c32.claim(m)?;
    let folded = c32.claim(n)?;

    // Phase 1: single pass over the window. Folds the text, caches bonuses,
    // records the first occurrence of each pattern byte in order plus the
    // last hit of the final one, and fills alignment row 0.
    let mut max_score: Score = 0;
    let mut max_score_pos = 0usize;
    let mut pidx = 0usize;
    let mut last_idx = 0usize;
    let pchar0 = pattern_byte(pattern, 0, case_sensitive);
    let mut pchar = pchar0;
    let mut prev_h0: Score = 0;
    let mut prev_class = CharClass::NonWord;
    let mut in_gap = false;

    for (off, &raw) in text[start..].iter().enumerate() {
        let class = char_class_of(raw);
        let mut c = raw;
        if !case_sensitive && class == CharClass::Upper {
            c = c.to_ascii_lowercase();
        }
        if normalization {
            c = normalize(c);
        }
        folded[start + off] = c as i32;
        let b = bonus_for(prev_class, class);
        bonus[start + off] = b;
        prev_class = class;

        if c == pchar {
            if pidx < m {
                first_occ[pidx] = (start + off) as i32;
                pidx += 1;
                pchar = pattern_byte(pattern, pidx.min(m - 1), case_sensitive);
            }
            last_idx = start + off;
        }

        let cell = if c == pchar0 {
            let score = SCORE_MATCH + b * BONUS_FIRST_CHAR_MULTIPLIER;
            c0[start + off] = 1;
            if m == 1 && score > max_score {
                max_score = score;
                max_score_pos = start + off;
                // No later single-byte match can beat a boundary hit; the
                // bonus ordering test in charset.rs keeps this pruning valid.
                if b == BONUS_BOUNDARY {
                    h0[start + off] = score;
                    break;
                }
            }
            in_gap = false;
            score
        } else {
            c0[start + off] = 0;
            let penalty = if in_gap { SCORE_GAP_EXTENSION } else { SCORE_GAP_START };
            in_gap = true;
            (prev_h0 + penalty).max(0)
        };
        h0[start + off] = cell;
        prev_h0 = cell;
    }

    if pidx != m {
        return Some(MatchResult::NONE);
    }
    if m == 1 {
        if let Some(pos) = pos.as_deref_mut() {
            pos.push(max_score_pos);
        }
        return Some(MatchResult {
            start: max_score_pos as i32,
            end: max_score_pos as i32 + 1,
            score: max_score as i32,
        });
    }

    // Phase 2: fill the remaining rows of the compacted score matrix H and
    // the parallel consecutive-run matrix C.
    let f0 = first_occ[0] as usize;
    let width = last_idx - f0 + 1;
    let h_cells = c16.claim(width * m)?;
    let c_cells = c16.claim(width * m)?;
    h_cells[..width].copy_from_slice(&h0[f0..=last_idx]);
    c_cells[..width].copy_from_slice(&c0[f0..=last_idx]);
    let mut h = Grid::new(h_cells, width, f0);
    let mut c = Grid::new(c_cells, width, f0);

    for row in 1..m {
        let row_start = first_occ[row] as usize;
        let pchar = pattern_byte(pattern, row, case_sensitive) as i32;
        let mut in_gap = false;

        for col in row_start..=last_idx {
            // Gap alternative: skip this text byte. The cell left of the
            // row's first column reads as zero.
            let left = if col > row_start { h.get(row, col - 1) } else { 0 };
            let s2 = left + if in_gap { SCORE_GAP_EXTENSION } else { SCORE_GAP_START };

            // Diagonal alternative: consume this text byte as a match.
            let mut s1: Score = 0;
            let mut consecutive: Score = 0;
            if folded[col] == pchar {
                s1 = h.get(row - 1, col - 1) + SCORE_MATCH;
                let mut b = bonus[col];
                consecutive = c.get(row - 1, col - 1) + 1;
                if b == BONUS_BOUNDARY {
                    // A boundary starts a fresh run; never inherit one.
                    consecutive = 1;
                } else if consecutive > 1 {
                    // Inside a run, escalate to the run's strongest claim:
                    // the consecutive floor or the bonus where it started.
                    b = b.max(BONUS_CONSECUTIVE).max(bonus[col + 1 - consecutive as usize]);
                }
                if s1 + b < s2 {
                    // Matching here loses to the gap even with the run
                    // bonus; count it as an isolated match at plain bonus.
                    s1 += bonus[col];
                    consecutive = 0;
                } else {
                    s1 += b;
                }
            }
            c.set(row, col, consecutive);
            in_gap = s1 < s2;
            let score = s1.max(s2).max(0);
            if row == m - 1 && score > max_score {
                max_score = score;
                max_score_pos = col;
            }
            h.set(row, col, score);
        }
    }

    // Phase 3: optional backtrace from the best terminal cell to row 0,
    // emitting the matched columns.
    let begin = match pos.as_deref_mut() {
        None => f0,
        Some(pos) => {
            let base = pos.len();
            pos.reserve(m);
            let mut row = m - 1;
            let mut col = max_score_pos;
            let mut prefer_match = true;
            loop {
                let s = h.get(row, col);
                let row_start = first_occ[row] as usize;
                let s1 = if row > 0 && col >= row_start {
                    h.get(row - 1, col - 1)
                } else {
                    0
                };
                let s2 = if col > row_start { h.get(row, col - 1) } else { 0 };

                // The cell beat its diagonal predecessor, so the optimal
                // path matched here — unless the gap score ties and a run
                // is not in play.
                let diagonal = s > s1 && (s > s2 || (s == s2 && prefer_match));

                // Lookahead for the next (leftward) step: stay in "prefer
                // match" mode while this cell extends a run or the cell one
                // row and column ahead starts one. Only consult that cell
                // inside its row's computed span; anything left of it was
                // never written this call.
                prefer_match = c.get(row, col) > 1
                    || (row + 1 < m
                        && col + 1 <= last_idx
                        && col + 1 >= first_occ[row + 1] as usize
                        && c.get(row + 1, col + 1) > 0);

                if diagonal {
                    pos.push(col);
                    if row == 0 {
                        break;
                    }
                    row -= 1;
                }
                col -= 1;
            }
            pos[base..].reverse();
            col
        }
    };

    Some(MatchResult {
        start: begin as i32,
        end: max_score_pos as i32 + 1,
        score: max_score as i32,
    })
}

// ---------------------------------------------------------------------------
// Public matcher struct
// ---------------------------------------------------------------------------

/// Fuzzy matcher using the sift alignment algorithm.
///
/// Owns one [`Arena`] per thread, so a single matcher can be shared across
/// a worker pool scoring candidates in parallel without any locking.
#[derive(Default)]
pub struct SiftMatcher {
    case: CaseMatching,
    normalization: bool,
    arena: ThreadLocal<RefCell<Arena>>,
}

impl SiftMatcher {
    /// Creates a matcher with the given case handling and normalization.
    pub fn new(case: CaseMatching, normalization: bool) -> Self {
        debug!("initialized sift matcher: case={case:?} normalization={normalization}");
        Self {
            case,
            normalization,
            ..Default::default()
        }
    }

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

    fn run(&self, choice: &str, pattern: &str, pos: Option<&mut MatchIndices>) -> MatchResult {
        let case_sensitive = self.is_case_sensitive(pattern);
        let mut arena = self.arena.get_or(|| RefCell::new(Arena::default())).borrow_mut();
        fuzzy_match(
            case_sensitive,
            self.normalization,
            choice.as_bytes(),
            pattern.as_bytes(),
            pos,
            Some(&mut arena),
        )
    }
}

impl std::fmt::Debug for SiftMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiftMatcher")
            .field("case", &self.case)
            .field("normalization", &self.normalization)
            .finish_non_exhaustive()
    }
}

impl FuzzyMatcher for SiftMatcher {
    fn fuzzy_indices(&self, choice: &str, pattern: &str) -> Option<(ScoreType, MatchIndices)> {
        let mut indices = MatchIndices::new();
        let res = self.run(choice, pattern, Some(&mut indices));
        res.is_match().then(|| (res.score as ScoreType, indices))
    }

    fn fuzzy_match(&self, choice: &str, pattern: &str) -> Option<ScoreType> {
        let res = self.run(choice, pattern, None);
        res.is_match().then_some(res.score as ScoreType)
    }

    fn fuzzy_match_range(&self, choice: &str, pattern: &str) -> Option<(ScoreType, usize, usize)> {
        let res = self.run(choice, pattern, None);
        res.is_match()
            .then_some((res.score as ScoreType, res.start as usize, res.end as usize))
    }
}

// ---------------------------------------------------------------------------
// Convenience free functions
// ---------------------------------------------------------------------------

/// Fuzzy match `choice` against `pattern` with smart case, returning the
/// score and matched byte indices.
pub fn fuzzy_indices(choice: &str, pattern: &str) -> Option<(ScoreType, MatchIndices)> {
    SiftMatcher::default().fuzzy_indices(choice, pattern)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
