//! Search statistics: hot spots, directory and symbol-kind distributions,
//! comment-vs-code splits, and multi-pattern co-occurrence.

use crate::filter::is_comment_line;
use crate::index::Index;
use crate::types::{EnhancedSymbol, FileId, GrepResult};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Path fragments that mark a file as test-related for statistics.
const TEST_PATH_MARKERS: &[&str] = &["_test.", ".test.", ".spec.", "test_", "/test/", "/tests/"];

/// Fallback symbol span when the index has no precise end line.
const SYMBOL_SPAN_GUESS: usize = 10;

/// Hot-spot list length.
const HOT_SPOT_LIMIT: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One file with an unusual concentration of matches.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotSpot {
    pub path: String,
    pub match_count: usize,
    pub first_line: usize,
    pub last_line: usize,
}

/// Aggregate statistics for one pattern.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub pattern: String,
    pub total_matches: usize,
    pub files_with_matches: usize,
    pub file_distribution: BTreeMap<String, usize>,
    pub dir_distribution: BTreeMap<String, usize>,
    pub test_file_matches: usize,
    pub comment_matches: usize,
    pub symbol_types: BTreeMap<String, usize>,
    pub definition_count: usize,
    pub usage_count: usize,
    pub exported_symbols: usize,
    pub hot_spots: Vec<HotSpot>,
    pub search_time_ms: u64,
}

/// Statistics for a set of patterns searched together.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSearchStats {
    pub patterns: BTreeMap<String, SearchStats>,
    /// Files appearing in every pattern's distribution, ascending.
    pub common_files: Vec<String>,
    /// `co_occurrence[p1][p2]` = files where both patterns matched.
    pub co_occurrence: BTreeMap<String, BTreeMap<String, usize>>,
}

// ---------------------------------------------------------------------------
// Single-pattern aggregation
// ---------------------------------------------------------------------------

fn is_test_path(path: &str) -> bool {
    TEST_PATH_MARKERS.iter().any(|marker| path.contains(marker))
}

fn dir_of(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => ".".to_string(),
    }
}

/// Containing symbol for a line, with the span-guess fallback when the
/// index lacks a usable end line.
fn containing_symbol<'a>(
    index: &'a dyn Index,
    file_id: FileId,
    line: usize,
) -> Option<&'a EnhancedSymbol> {
    if let Some(sym) = index.symbol_at_line(file_id, line) {
        return Some(sym);
    }
    index
        .file_enhanced_symbols(file_id)?
        .iter()
        .filter(|s| line >= s.line && line <= s.line + SYMBOL_SPAN_GUESS)
        .min_by_key(|s| line - s.line)
}

fn matched_lines_of(result: &GrepResult) -> Vec<usize> {
    match &result.context {
        Some(ctx) if !ctx.matched_lines.is_empty() => ctx.matched_lines.clone(),
        _ => vec![result.line],
    }
}

fn match_count_of(result: &GrepResult) -> usize {
    result
        .file_match_count
        .or_else(|| result.context.as_ref().map(|c| c.match_count))
        .unwrap_or(1)
        .max(1)
}

/// Derive statistics from a finished search.
pub(crate) fn aggregate(
    index: &dyn Index,
    pattern: &str,
    results: &[GrepResult],
    search_time_ms: u64,
) -> SearchStats {
    let mut stats = SearchStats {
        pattern: pattern.to_string(),
        search_time_ms,
        ..Default::default()
    };

    struct FileAgg {
        count: usize,
        first_line: usize,
        last_line: usize,
    }
    let mut per_file: HashMap<FileId, (String, FileAgg)> = HashMap::new();

    for result in results {
        let count = match_count_of(result);
        stats.total_matches += count;
        *stats.file_distribution.entry(result.path.clone()).or_default() += count;
        *stats.dir_distribution.entry(dir_of(&result.path)).or_default() += count;
        if is_test_path(&result.path) {
            stats.test_file_matches += count;
        }

        let lines = matched_lines_of(result);
        let agg = per_file.entry(result.file_id).or_insert_with(|| {
            (result.path.clone(), FileAgg { count: 0, first_line: usize::MAX, last_line: 0 })
        });
        agg.1.count += count;
        for &line in &lines {
            agg.1.first_line = agg.1.first_line.min(line);
            agg.1.last_line = agg.1.last_line.max(line);
        }

        for &line in &lines {
            // Prefer the context copy of the line; fall back to the index
            let line_text: Vec<u8> = result
                .context
                .as_ref()
                .filter(|ctx| line >= ctx.start_line && line <= ctx.end_line)
                .and_then(|ctx| ctx.lines.get(line - ctx.start_line))
                .map(|s| s.as_bytes().to_vec())
                .or_else(|| index.file_line(result.file_id, line).map(<[u8]>::to_vec))
                .unwrap_or_default();

            if is_comment_line(&line_text) {
                stats.comment_matches += 1;
            }

            if let Some(sym) = containing_symbol(index, result.file_id, line) {
                *stats.symbol_types.entry(sym.kind.label().to_string()).or_default() += 1;
                let trimmed: Vec<u8> = {
                    let mut i = 0;
                    while i < line_text.len() && (line_text[i] == b' ' || line_text[i] == b'\t') {
                        i += 1;
                    }
                    line_text[i..].to_vec()
                };
                if trimmed.starts_with(sym.name.as_bytes()) {
                    stats.definition_count += 1;
                } else {
                    stats.usage_count += 1;
                }
                if sym.name.as_bytes().first().is_some_and(u8::is_ascii_uppercase) {
                    stats.exported_symbols += 1;
                }
            }
        }
    }

    stats.files_with_matches = stats.file_distribution.len();

    let mut spots: Vec<HotSpot> = per_file
        .into_values()
        .map(|(path, agg)| HotSpot {
            path,
            match_count: agg.count,
            first_line: if agg.first_line == usize::MAX { 0 } else { agg.first_line },
            last_line: agg.last_line,
        })
        .collect();
    spots.sort_by(|a, b| b.match_count.cmp(&a.match_count).then(a.path.cmp(&b.path)));
    spots.truncate(HOT_SPOT_LIMIT);
    stats.hot_spots = spots;

    stats
}

// ---------------------------------------------------------------------------
// Multi-pattern aggregation
// ---------------------------------------------------------------------------

/// Combine per-pattern stats into common-file and co-occurrence views.
pub(crate) fn aggregate_multi(per_pattern: Vec<(String, SearchStats)>) -> MultiSearchStats {
    let mut multi = MultiSearchStats::default();

    // Common files: present in every non-empty pattern distribution
    let mut common: Option<Vec<String>> = None;
    for (_, stats) in &per_pattern {
        let files: Vec<String> = stats.file_distribution.keys().cloned().collect();
        common = Some(match common {
            None => files,
            Some(prev) => prev.into_iter().filter(|f| files.contains(f)).collect(),
        });
    }
    let mut common = common.unwrap_or_default();
    common.sort();
    multi.common_files = common;

    // Symmetric co-occurrence counts
    for (i, (p1, s1)) in per_pattern.iter().enumerate() {
        for (p2, s2) in per_pattern.iter().skip(i + 1) {
            let shared = s1
                .file_distribution
                .keys()
                .filter(|f| s2.file_distribution.contains_key(*f))
                .count();
            multi
                .co_occurrence
                .entry(p1.clone())
                .or_default()
                .insert(p2.clone(), shared);
            multi
                .co_occurrence
                .entry(p2.clone())
                .or_default()
                .insert(p1.clone(), shared);
        }
    }

    for (pattern, stats) in per_pattern {
        multi.patterns.insert(pattern, stats);
    }

    multi
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
