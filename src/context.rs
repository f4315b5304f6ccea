//! Context extraction: locate the enclosing syntactic block of a match and
//! return a bounded, complete, centered window of lines around it.
//!
//! Block boundaries arrive 0-based from the index and are converted to
//! 1-based lines exactly once, here. A block spanning more lines than the
//! giant-function threshold is treated as a parser artifact and context
//! degrades to a small line window with `is_complete = false`.

use crate::lines::{FileView, LineProvider};
use crate::types::{BlockBoundary, BlockKind, ExtractedContext};
use tracing::warn;

/// Window returned when no usable block encloses the match.
const FALLBACK_RADIUS: usize = 5;

/// Full blocks longer than this come back as a centered window instead.
const FULL_BLOCK_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

pub(crate) struct ContextParams<'a> {
    pub full_function: bool,
    /// `None` or `Some(0)` selects block mode; `Some(n)` a ±n/2 window.
    pub max_context_lines: Option<usize>,
    pub max_function_lines: usize,
    pub blocks: Option<&'a [BlockBoundary]>,
}

// ---------------------------------------------------------------------------
// Block location
// ---------------------------------------------------------------------------

/// The smallest block containing a 0-based line, optionally restricted to
/// function-like kinds.
fn smallest_enclosing_block<'a>(
    blocks: &'a [BlockBoundary],
    line0: usize,
    function_only: bool,
) -> Option<&'a BlockBoundary> {
    blocks
        .iter()
        .filter(|b| b.contains_line0(line0))
        .filter(|b| !function_only || b.kind.is_function_like())
        .min_by_key(|b| b.span())
}

/// Walk upward from `block_start` (1-based) collecting contiguous leading
/// comment/annotation/attribute lines.
fn leading_comment_start(view: &FileView, block_start: usize) -> usize {
    let mut start = block_start;
    while start > 1 {
        let Some(line) = view.line(start - 1) else { break };
        let trimmed: &[u8] = {
            let mut i = 0;
            while i < line.len() && (line[i] == b' ' || line[i] == b'\t') {
                i += 1;
            }
            &line[i..]
        };
        let is_annotation = trimmed.starts_with(b"//")
            || trimmed.starts_with(b"/*")
            || trimmed.starts_with(b"*")
            || trimmed.starts_with(b"@")
            || trimmed.starts_with(b"#");
        if trimmed.is_empty() || !is_annotation {
            break;
        }
        start -= 1;
    }
    start
}

// ---------------------------------------------------------------------------
// Window building
// ---------------------------------------------------------------------------

fn clamped_window(center: usize, radius: usize, line_count: usize) -> (usize, usize) {
    let start = center.saturating_sub(radius).max(1);
    let end = (center + radius).min(line_count.max(1));
    (start, end)
}

/// Materialize a `[start, end]` line window into an `ExtractedContext`,
/// filtering the matched-line set down to the window.
pub(crate) fn window_context(
    view: &FileView,
    start_line: usize,
    end_line: usize,
    block_type: BlockKind,
    block_name: &str,
    is_complete: bool,
    matched_lines: &[usize],
    match_count: usize,
) -> ExtractedContext {
    let line_count = view.line_count();
    let start_line = start_line.clamp(1, line_count.max(1));
    let end_line = end_line.clamp(start_line, line_count.max(1));

    let lines: Vec<String> = (start_line..=end_line)
        .map(|n| view.line_string(n).unwrap_or_default())
        .collect();

    let mut in_window: Vec<usize> =
        matched_lines.iter().copied().filter(|&l| l >= start_line && l <= end_line).collect();
    in_window.sort_unstable();
    in_window.dedup();

    ExtractedContext {
        start_line,
        end_line,
        lines,
        block_type,
        block_name: block_name.to_string(),
        is_complete,
        matched_lines: in_window,
        match_count,
    }
}

fn fallback_context(
    view: &FileView,
    match_line: usize,
    matched_lines: &[usize],
    match_count: usize,
) -> ExtractedContext {
    let (start, end) = clamped_window(match_line, FALLBACK_RADIUS, view.line_count());
    window_context(view, start, end, BlockKind::Lines, "", false, matched_lines, match_count)
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract context around `match_line` (1-based) according to the mode
/// precedence: full-function, then block mode, then line mode.
pub(crate) fn extract_context(
    view: &FileView,
    params: &ContextParams,
    match_line: usize,
    matched_lines: &[usize],
    match_count: usize,
) -> ExtractedContext {
    let line_mode = params.max_context_lines.filter(|&n| n > 0);

    if params.full_function || line_mode.is_none() {
        let function_only = params.full_function;
        let block = params
            .blocks
            .and_then(|blocks| smallest_enclosing_block(blocks, match_line.saturating_sub(1), function_only));

        let Some(block) = block else {
            return fallback_context(view, match_line, matched_lines, match_count);
        };

        // Corrupt boundary: degrade to line mode rather than trusting it
        if block.end < block.start || block.end >= view.line_count() + FULL_BLOCK_LIMIT {
            warn!(name = %block.name, start = block.start, end = block.end, "suspect block boundary");
            return fallback_context(view, match_line, matched_lines, match_count);
        }

        let block_start = block.start + 1;
        let block_end = (block.end + 1).min(view.line_count());
        let span = block_end - block_start + 1;

        if span > params.max_function_lines {
            return fallback_context(view, match_line, matched_lines, match_count);
        }

        if span <= FULL_BLOCK_LIMIT {
            let mut start = leading_comment_start(view, block_start);
            let mut end = block_end;

            if params.full_function {
                // Drop a stray package clause picked up by comment attachment
                if let Some(first) = view.line(start) {
                    if first.starts_with(b"package ") {
                        start = (start + 1).min(end);
                    }
                }
                // Trailing blank line adds nothing to a complete function
                if end > start && view.line(end).is_some_and(|l| l.is_empty()) {
                    end -= 1;
                }
            }

            return window_context(
                view,
                start,
                end,
                block.kind,
                &block.name,
                true,
                matched_lines,
                match_count,
            );
        }

        // Oversized but plausible block: centered window clamped to it
        let start = match_line.saturating_sub(FULL_BLOCK_LIMIT / 2).max(block_start);
        let end = (start + FULL_BLOCK_LIMIT - 1).min(block_end);
        return window_context(
            view,
            start,
            end,
            block.kind,
            &block.name,
            false,
            matched_lines,
            match_count,
        );
    }

    // Line mode: ±n/2 around the match
    let radius = line_mode.unwrap_or(0) / 2;
    let (start, end) = clamped_window(match_line, radius, view.line_count());
    window_context(view, start, end, BlockKind::Lines, "", false, matched_lines, match_count)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
