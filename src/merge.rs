//! Merging of nearby matches into function-scoped windows.
//!
//! Each match starts as a ±2-line window, grows to the enclosing function
//! when there is one, then windows are coalesced: non-function windows
//! swallowed by a function window transfer their matches into it, and
//! remaining windows merge while the gap between them is at most one line.
//! Per-line provenance is preserved so merged results keep every matched
//! line number.

use crate::types::{BlockBoundary, BlockKind, Match};

/// Half-height of the seed window around a lone match line.
const SEED_RADIUS: usize = 2;

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// One scored match, located on its line.
#[derive(Debug, Clone)]
pub(crate) struct LineMatch {
    pub m: Match,
    /// 1-based.
    pub line: usize,
    /// 0-based byte offset from line start.
    pub column: usize,
    pub score: f64,
}

/// A coalesced window of matches.
#[derive(Debug, Clone)]
pub(crate) struct MergedWindow {
    /// 1-based inclusive bounds.
    pub start: usize,
    pub end: usize,
    pub is_function: bool,
    /// Kind and name of the function block, when `is_function`.
    pub block: Option<(BlockKind, String)>,
    pub matches: Vec<LineMatch>,
    pub score: f64,
}

impl MergedWindow {
    /// The highest-scoring constituent match (ties broken by position).
    pub fn best_match(&self) -> &LineMatch {
        self.matches
            .iter()
            .min_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.line.cmp(&b.line))
                    .then(a.column.cmp(&b.column))
            })
            .expect("merged windows always contain at least one match")
    }

    /// Distinct matched lines, sorted ascending.
    pub fn matched_lines(&self) -> Vec<usize> {
        let mut lines: Vec<usize> = self.matches.iter().map(|m| m.line).collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

fn enclosing_function<'a>(
    blocks: Option<&'a [BlockBoundary]>,
    line: usize,
) -> Option<&'a BlockBoundary> {
    blocks?
        .iter()
        .filter(|b| b.kind.is_function_like() && b.contains_line0(line.saturating_sub(1)))
        .min_by_key(|b| b.span())
}

/// Coalesce per-match windows into merged result windows.
pub(crate) fn merge_matches(
    line_count: usize,
    blocks: Option<&[BlockBoundary]>,
    matches: Vec<LineMatch>,
) -> Vec<MergedWindow> {
    let mut windows: Vec<MergedWindow> = matches
        .into_iter()
        .map(|lm| match enclosing_function(blocks, lm.line) {
            Some(block) => MergedWindow {
                start: block.start + 1,
                end: (block.end + 1).min(line_count.max(1)),
                is_function: true,
                block: Some((block.kind, block.name.clone())),
                score: lm.score,
                matches: vec![lm],
            },
            None => MergedWindow {
                start: lm.line.saturating_sub(SEED_RADIUS).max(1),
                end: (lm.line + SEED_RADIUS).min(line_count.max(1)),
                is_function: false,
                block: None,
                score: lm.score,
                matches: vec![lm],
            },
        })
        .collect();

    // Transfer non-function windows swallowed by a function window
    let function_spans: Vec<(usize, usize)> = windows
        .iter()
        .filter(|w| w.is_function)
        .map(|w| (w.start, w.end))
        .collect();
    let mut transferred: Vec<LineMatch> = Vec::new();
    windows.retain_mut(|w| {
        if w.is_function {
            return true;
        }
        let swallowed =
            function_spans.iter().any(|&(start, end)| start <= w.start && w.end <= end);
        if swallowed {
            transferred.append(&mut w.matches);
        }
        !swallowed
    });
    for lm in transferred {
        let target = windows
            .iter_mut()
            .filter(|w| w.is_function && w.start <= lm.line && lm.line <= w.end)
            .min_by_key(|w| w.end - w.start);
        if let Some(w) = target {
            w.score = w.score.max(lm.score);
            w.matches.push(lm);
        }
    }

    windows.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

    // Iteratively merge windows whose gap is at most one line
    let mut merged: Vec<MergedWindow> = Vec::with_capacity(windows.len());
    for next in windows {
        match merged.last_mut() {
            Some(cur) if next.start <= cur.end + 2 => {
                cur.end = cur.end.max(next.end);
                cur.start = cur.start.min(next.start);
                cur.score = cur.score.max(next.score);
                cur.matches.extend(next.matches);
                if next.is_function && !cur.is_function {
                    cur.is_function = true;
                    cur.block = next.block;
                }
            }
            _ => merged.push(next),
        }
    }

    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
