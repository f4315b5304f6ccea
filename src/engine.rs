//! Query orchestration: the public search entry points.
//!
//! A query flows through candidate resolution, the byte scanners, the
//! semantic filter, optional merging, context extraction, and scoring, then
//! is shaped for output. Soft failures (invalid regex, invalid include
//! glob, missing files) degrade to empty or partial results and park a
//! diagnostic in `last_error`; they never fail the query.

use crate::candidates::resolve_candidates;
use crate::context::{extract_context, window_context, ContextParams};
use crate::error::EngineError;
use crate::filter::{passes_semantic_filters, SymbolLookup};
use crate::index::{Capabilities, Index};
use crate::lines::{FileView, LineProvider};
use crate::merge::{merge_matches, LineMatch};
use crate::options::{EngineConfig, SearchOptions};
use crate::regex_cache::RegexCache;
use crate::scan::{
    has_regex_metachars, invert_matches, literal_matches, regex_matches, word_boundary_pattern,
    LiteralScan, PatternMatcher,
};
use crate::score::{score_match, sort_by_score, ScoreInput};
use crate::semantic::{ContainmentScorer, SemanticScorer};
use crate::stats::{aggregate, aggregate_multi, MultiSearchStats, SearchStats};
use crate::types::{
    BlockKind, FileId, GrepResult, Match, ObjectIds, StandardResult, SymbolId,
};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Merged windows wider than this come back centered on the best match.
const MERGED_WINDOW_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The search engine. Owns only its compiled-regex cache, its semantic
/// scorer, and the capability snapshot taken at construction; everything
/// per-query is created and dropped with the call, so a shared engine is
/// safe for concurrent readers whenever the index is.
pub struct SearchEngine {
    index: Arc<dyn Index>,
    config: EngineConfig,
    scorer: Box<dyn SemanticScorer>,
    regex_cache: RegexCache,
    caps: Capabilities,
    last_error: Mutex<Option<EngineError>>,
}

impl SearchEngine {
    pub fn new(index: Arc<dyn Index>) -> Self {
        let config = index
            .config_provider()
            .map(|p| p.engine_config())
            .unwrap_or_default();
        Self::with_config(index, config)
    }

    pub fn with_config(index: Arc<dyn Index>, config: EngineConfig) -> Self {
        Self::with_scorer(index, config, Box::new(ContainmentScorer))
    }

    pub fn with_scorer(
        index: Arc<dyn Index>,
        config: EngineConfig,
        scorer: Box<dyn SemanticScorer>,
    ) -> Self {
        let caps = Capabilities::probe(index.as_ref());
        let regex_cache = RegexCache::new(config.regex_cache_size);
        Self { index, config, scorer, regex_cache, caps, last_error: Mutex::new(None) }
    }

    /// Most recent soft error (invalid regex or glob, unsupported option,
    /// missing file). Persisting errors never affect later queries.
    pub fn last_error(&self) -> Option<EngineError> {
        self.last_error.lock().clone()
    }

    fn set_error(&self, error: EngineError) {
        *self.last_error.lock() = Some(error);
    }

    // -----------------------------------------------------------------------
    // Public entry points
    // -----------------------------------------------------------------------

    /// Literal search with a fixed context window (`0` = block-scoped).
    pub fn search(
        &self,
        pattern: &str,
        candidates: &[FileId],
        max_context_lines: usize,
    ) -> Vec<GrepResult> {
        let options =
            SearchOptions { max_context_lines: Some(max_context_lines), ..Default::default() };
        self.search_with_options(pattern, candidates, &options)
    }

    pub fn search_with_options(
        &self,
        pattern: &str,
        candidates: &[FileId],
        options: &SearchOptions,
    ) -> Vec<GrepResult> {
        let start = Instant::now();

        if options.strings_only {
            self.set_error(EngineError::Unsupported("stringsOnly"));
            return Vec::new();
        }
        if options.template_strings {
            self.set_error(EngineError::Unsupported("templateStrings"));
            return Vec::new();
        }

        if options.patterns.len() > 1 {
            return self.multi_pattern_search(candidates, options);
        }
        let pattern = options.patterns.first().map_or(pattern, String::as_str);
        if pattern.is_empty() {
            return Vec::new();
        }

        let mut results = self.run_single(pattern, candidates, options);

        if !options.count_per_file && !options.files_only {
            sort_by_score(&mut results);
        }

        debug!(
            pattern,
            results = results.len(),
            time_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );
        results
    }

    /// Search, then attach the declared symbol and enclosing scope to each
    /// result.
    pub fn search_detailed(
        &self,
        pattern: &str,
        candidates: &[FileId],
        options: &SearchOptions,
    ) -> Vec<StandardResult> {
        self.search_with_options(pattern, candidates, options)
            .into_iter()
            .map(|result| {
                let symbol_id = self
                    .index
                    .enhanced_symbol_at_line(result.file_id, result.line)
                    .map(|sym| sym.id);
                let scope = self.index.file_scope_info(result.file_id, result.line);
                let object_ids = options.include_object_ids.then(|| ObjectIds {
                    file_id: result.file_id.0,
                    symbol_id: symbol_id.map(|SymbolId(raw)| raw),
                });
                StandardResult { result, symbol_id, scope, object_ids }
            })
            .collect()
    }

    /// Search and derive distribution statistics from the results.
    pub fn search_stats(
        &self,
        pattern: &str,
        candidates: &[FileId],
        options: &SearchOptions,
    ) -> SearchStats {
        let start = Instant::now();
        let results = self.search_with_options(pattern, candidates, options);
        aggregate(
            self.index.as_ref(),
            pattern,
            &results,
            start.elapsed().as_millis() as u64,
        )
    }

    /// Per-pattern statistics plus common-file and co-occurrence views.
    pub fn multi_search_stats(
        &self,
        patterns: &[String],
        candidates: &[FileId],
        options: &SearchOptions,
    ) -> MultiSearchStats {
        let mut sub = options.clone();
        sub.patterns = Vec::new();
        let per_pattern: Vec<(String, SearchStats)> = patterns
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| (p.clone(), self.search_stats(p, candidates, &sub)))
            .collect();
        aggregate_multi(per_pattern)
    }

    // -----------------------------------------------------------------------
    // Multi-pattern OR
    // -----------------------------------------------------------------------

    /// OR-of-patterns: search each independently, keep one result per
    /// `(file, line)`, and order ascending by `(file, line)`.
    fn multi_pattern_search(
        &self,
        candidates: &[FileId],
        options: &SearchOptions,
    ) -> Vec<GrepResult> {
        let mut sub = options.clone();
        sub.patterns = Vec::new();

        let mut seen: HashSet<(FileId, usize)> = HashSet::new();
        let mut combined: Vec<GrepResult> = Vec::new();
        for pattern in options.patterns.iter().filter(|p| !p.is_empty()) {
            for result in self.run_single(pattern, candidates, &sub) {
                if seen.insert((result.file_id, result.line)) {
                    combined.push(result);
                }
            }
        }
        combined.sort_by(|a, b| a.file_id.cmp(&b.file_id).then(a.line.cmp(&b.line)));
        combined
    }

    // -----------------------------------------------------------------------
    // Single-pattern execution
    // -----------------------------------------------------------------------

    fn run_single(
        &self,
        pattern: &str,
        candidates: &[FileId],
        options: &SearchOptions,
    ) -> Vec<GrepResult> {
        // A "regex" without metacharacters is just a literal
        let effective_regex = options.use_regex && has_regex_metachars(pattern);

        let resolution = resolve_candidates(
            self.index.as_ref(),
            self.caps,
            pattern,
            candidates,
            effective_regex,
            options,
        );
        for error in resolution.errors {
            self.set_error(error);
        }
        let mut ids = resolution.ids;
        if ids.is_empty() {
            return Vec::new();
        }

        // Effective cap on files *processed*, not on matches
        let file_cap = if options.max_results > 0 {
            options.max_results
        } else if ids.len() >= self.config.auto_cap_threshold {
            self.config.auto_cap_files
        } else {
            usize::MAX
        };
        ids.truncate(file_cap);

        let per_file_cap = if options.max_count_per_file > 0 {
            Some(options.max_count_per_file)
        } else if options.declaration_only {
            None
        } else {
            Some(self.config.per_file_match_cap)
        };

        let scanner = match self.build_scanner(pattern, options, effective_regex) {
            Some(scanner) => scanner,
            None => return Vec::new(),
        };

        let per_file: Vec<Vec<GrepResult>> = ids
            .par_iter()
            .map(|&id| {
                if options.is_cancelled() {
                    return Vec::new();
                }
                self.process_file(id, pattern, &scanner, per_file_cap, options)
            })
            .collect();

        if options.is_cancelled() {
            return Vec::new();
        }
        per_file.into_iter().flatten().collect()
    }

    fn build_scanner(
        &self,
        pattern: &str,
        options: &SearchOptions,
        effective_regex: bool,
    ) -> Option<Scanner> {
        let regex_source = if effective_regex {
            Some(pattern.to_string())
        } else if options.word_boundary {
            Some(word_boundary_pattern(pattern))
        } else {
            None
        };

        let matcher = match regex_source {
            Some(source) => match self.regex_cache.compile(&source, options.case_insensitive) {
                Ok(re) => PatternMatcher::Regex(re),
                Err(error) => {
                    warn!(pattern, "regex compilation failed");
                    self.set_error(error);
                    return None;
                }
            },
            None => PatternMatcher::Literal {
                needle: if options.case_insensitive {
                    pattern.to_ascii_lowercase().into_bytes()
                } else {
                    pattern.as_bytes().to_vec()
                },
                case_insensitive: options.case_insensitive,
            },
        };

        Some(Scanner { matcher, invert: options.invert_match })
    }

    // -----------------------------------------------------------------------
    // Per-file pipeline
    // -----------------------------------------------------------------------

    fn process_file(
        &self,
        id: FileId,
        pattern: &str,
        scanner: &Scanner,
        per_file_cap: Option<usize>,
        options: &SearchOptions,
    ) -> Vec<GrepResult> {
        let Some(content) = self.index.file_content(id) else {
            warn!(file = id.0, "file missing from index, skipping");
            self.set_error(EngineError::MissingFile(id));
            return Vec::new();
        };
        let Some(info) = self.index.file_info(id) else {
            warn!(file = id.0, "file info missing from index, skipping");
            self.set_error(EngineError::MissingFile(id));
            return Vec::new();
        };

        let raw = scanner.scan(content, pattern, per_file_cap, options);
        if raw.is_empty() {
            return Vec::new();
        }

        let view = FileView::new(content, self.index.file_line_offsets(id));
        let symbols = self.index.file_enhanced_symbols(id);
        let line_map = self.index.file_line_to_symbols(id);
        let lookup = match (symbols, line_map) {
            (Some(symbols), Some(line_map)) => Some(SymbolLookup { symbols, line_map }),
            _ => None,
        };

        // Filter and score each raw match on its line
        let mut scored: Vec<LineMatch> = Vec::with_capacity(raw.len());
        for m in raw {
            let line = view.line_of_offset(m.start);
            let line_text = view.line(line).unwrap_or(b"");
            let (passes, symbol) = passes_semantic_filters(
                line_text,
                line,
                pattern,
                options,
                lookup,
                self.scorer.as_ref(),
            );
            if !passes {
                continue;
            }
            let score = score_match(&ScoreInput {
                line_text,
                exact: m.exact,
                query: pattern,
                rel_path: &info.rel_path,
                ext: &info.ext,
                symbol,
                require_symbol: options.require_symbol,
                ranking: &self.config.ranking,
            });
            scored.push(LineMatch { m, line, column: view.column_of_offset(m.start), score });
        }
        if scored.is_empty() {
            return Vec::new();
        }

        if options.files_only {
            let best = scored.iter().map(|s| s.score).fold(f64::MIN, f64::max);
            return vec![GrepResult {
                file_id: id,
                path: info.rel_path.clone(),
                line: 0,
                column: 0,
                match_text: String::new(),
                context: None,
                score: best,
                file_match_count: None,
            }];
        }
        if options.count_per_file {
            let first = &scored[0];
            let best = scored.iter().map(|s| s.score).fold(f64::MIN, f64::max);
            return vec![GrepResult {
                file_id: id,
                path: info.rel_path.clone(),
                line: first.line,
                column: first.column,
                match_text: snippet(content, &first.m),
                context: None,
                score: best,
                file_match_count: Some(scored.len()),
            }];
        }

        let merge = options.merge_file_results
            && scored.len() > 1
            && !options.has_semantic_filter();
        if merge {
            self.merged_results(id, &info.rel_path, content, &view, scored)
        } else {
            self.line_results(id, &info.rel_path, content, &view, scored, options)
        }
    }

    /// One result per matched line, block- or line-scoped context.
    fn line_results(
        &self,
        id: FileId,
        rel_path: &str,
        content: &[u8],
        view: &FileView,
        scored: Vec<LineMatch>,
        options: &SearchOptions,
    ) -> Vec<GrepResult> {
        let params = ContextParams {
            full_function: options.full_function,
            max_context_lines: if options.ensure_complete_stmt {
                None
            } else {
                options.max_context_lines
            },
            max_function_lines: options
                .max_function_lines
                .unwrap_or(self.config.max_function_lines),
            blocks: self.index.file_blocks(id),
        };

        let mut by_line: BTreeMap<usize, Vec<LineMatch>> = BTreeMap::new();
        for lm in scored {
            by_line.entry(lm.line).or_default().push(lm);
        }

        by_line
            .into_iter()
            .map(|(line, group)| {
                // Representative match: exact beats inexact, then first
                let rep = group
                    .iter()
                    .find(|lm| lm.m.exact)
                    .unwrap_or(&group[0]);
                let best_score = group.iter().map(|lm| lm.score).fold(f64::MIN, f64::max);
                let context =
                    extract_context(view, &params, line, &[line], group.len());
                GrepResult {
                    file_id: id,
                    path: rel_path.to_string(),
                    line,
                    column: rep.column,
                    match_text: snippet(content, &rep.m),
                    context: Some(context),
                    score: best_score,
                    file_match_count: None,
                }
            })
            .collect()
    }

    /// Function-scoped merged results preserving per-line provenance.
    fn merged_results(
        &self,
        id: FileId,
        rel_path: &str,
        content: &[u8],
        view: &FileView,
        scored: Vec<LineMatch>,
    ) -> Vec<GrepResult> {
        let blocks = self.index.file_blocks(id);
        let windows = merge_matches(view.line_count(), blocks, scored);

        windows
            .into_iter()
            .map(|window| {
                let matched_lines = window.matched_lines();
                let match_count = window.matches.len();
                let best = window.best_match().clone();

                let (block_type, block_name) = match (&window.block, window.is_function) {
                    (Some((kind, name)), true) => (*kind, name.clone()),
                    _ if window.matches.len() > 1 => (BlockKind::Context, String::new()),
                    _ => (BlockKind::Lines, String::new()),
                };

                let span = window.end - window.start + 1;
                let context = if span > MERGED_WINDOW_LIMIT {
                    // Oversized window: recenter on the best match
                    let start =
                        best.line.saturating_sub(MERGED_WINDOW_LIMIT / 2).max(window.start);
                    let end = (start + MERGED_WINDOW_LIMIT - 1).min(window.end);
                    window_context(
                        view,
                        start,
                        end,
                        block_type,
                        &block_name,
                        false,
                        &matched_lines,
                        match_count,
                    )
                } else {
                    window_context(
                        view,
                        window.start,
                        window.end,
                        block_type,
                        &block_name,
                        window.is_function,
                        &matched_lines,
                        match_count,
                    )
                };

                GrepResult {
                    file_id: id,
                    path: rel_path.to_string(),
                    line: best.line,
                    column: best.column,
                    match_text: snippet(content, &best.m),
                    context: Some(context),
                    score: window.score,
                    file_match_count: None,
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Scanner dispatch
// ---------------------------------------------------------------------------

struct Scanner {
    matcher: PatternMatcher,
    invert: bool,
}

impl Scanner {
    fn scan(
        &self,
        content: &[u8],
        pattern: &str,
        cap: Option<usize>,
        options: &SearchOptions,
    ) -> Vec<Match> {
        if self.invert {
            return invert_matches(content, &self.matcher, cap);
        }
        match &self.matcher {
            PatternMatcher::Literal { case_insensitive, .. } => literal_matches(
                content,
                pattern.as_bytes(),
                &LiteralScan {
                    case_insensitive: *case_insensitive,
                    exclude_comments: options.skip_comment_lines(),
                    max_matches: cap,
                },
            ),
            PatternMatcher::Regex(re) => regex_matches(content, re, cap),
        }
    }
}

fn snippet(content: &[u8], m: &Match) -> String {
    String::from_utf8_lossy(&content[m.start..m.end.min(content.len())]).into_owned()
}
