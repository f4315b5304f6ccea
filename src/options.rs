//! Per-query options and engine-level configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative cancellation signal, checked between candidate files.
/// A cancelled query returns an empty result set without partial output.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Search options
// ---------------------------------------------------------------------------

/// All knobs accepted by `search_with_options` and friends.
///
/// The default value is a plain literal search with block-mode context.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Lowercase both sides before comparison (literal) or set the
    /// case-insensitive flag (regex).
    pub case_insensitive: bool,
    /// Treat the pattern as a multiline regex. Downgraded to literal when
    /// the pattern contains no regex metacharacters.
    pub use_regex: bool,
    /// Force word-bounded matching; a literal pattern is rewritten to a
    /// `\b…\b` regex.
    pub word_boundary: bool,
    /// Return every line *without* a match.
    pub invert_match: bool,
    /// Cap on files processed. 0 = automatic.
    pub max_results: usize,
    /// Per-file match cap. 0 = engine default.
    pub max_count_per_file: usize,
    /// `None` or `Some(0)` = block-scoped context; `Some(n)` = ±n/2 lines.
    pub max_context_lines: Option<usize>,
    /// Include leading comments and complete signatures in context.
    pub ensure_complete_stmt: bool,
    /// Use function-scoped context.
    pub full_function: bool,
    /// Per-query override for the giant-function sanity threshold.
    pub max_function_lines: Option<usize>,
    /// Merge nearby matches into function-scoped windows.
    pub merge_file_results: bool,
    /// Restrict to the named symbol kinds (case-insensitive labels).
    pub symbol_types: Vec<String>,
    /// Keep only lines that declare a symbol. Mutually exclusive with
    /// `usage_only`.
    pub declaration_only: bool,
    /// Keep only lines that do not declare a symbol.
    pub usage_only: bool,
    /// Require the declared symbol to be exported.
    pub exported_only: bool,
    /// Require the declared symbol to be mutable.
    pub mutable_only: bool,
    /// Require the declared symbol to be a global.
    pub global_only: bool,
    /// Heavily penalize lines with no declared symbol.
    pub require_symbol: bool,
    /// Skip lines that are comment-only.
    pub exclude_comments: bool,
    /// Alias for `exclude_comments`.
    pub code_only: bool,
    /// Keep only lines that are comment-like.
    pub comments_only: bool,
    /// Unsupported match surface; queries using it are rejected.
    pub strings_only: bool,
    /// Unsupported match surface; queries using it are rejected.
    pub template_strings: bool,
    /// Comma-separated include globs, matched against relative and
    /// absolute paths.
    pub include_pattern: Option<String>,
    /// Comma-separated exclude globs.
    pub exclude_pattern: Option<String>,
    /// OR-of-patterns; when more than one entry is present the query is
    /// dispatched to multi-pattern search.
    pub patterns: Vec<String>,
    /// Collapse output to one result per file with its match count.
    pub count_per_file: bool,
    /// Collapse output to one result per file, line 0.
    pub files_only: bool,
    /// Populate dense object ids on detailed results.
    pub include_object_ids: bool,
    /// Optional cooperative cancellation signal.
    pub cancel: Option<CancelToken>,
}

impl SearchOptions {
    /// Whether any semantic predicate is active (these disable merging).
    pub(crate) fn has_semantic_filter(&self) -> bool {
        self.declaration_only
            || self.usage_only
            || self.exported_only
            || self.mutable_only
            || self.global_only
            || !self.symbol_types.is_empty()
    }

    pub(crate) fn skip_comment_lines(&self) -> bool {
        self.exclude_comments || self.code_only
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

// ---------------------------------------------------------------------------
// Ranking configuration
// ---------------------------------------------------------------------------

/// Weights applied by the scorer. Loadable from the index's config
/// capability; defaults favor code over docs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankingConfig {
    pub enabled: bool,
    pub code_file_boost: f64,
    pub doc_file_penalty: f64,
    pub config_file_boost: f64,
    pub require_symbol: bool,
    pub non_symbol_penalty: Option<f64>,
    /// Per-extension weight (keyed without the leading dot) that replaces
    /// the category contribution entirely.
    pub extension_weights: HashMap<String, f64>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            code_file_boost: 50.0,
            doc_file_penalty: -20.0,
            config_file_boost: 10.0,
            require_symbol: false,
            non_symbol_penalty: None,
            extension_weights: HashMap::new(),
        }
    }
}

impl RankingConfig {
    /// Test files score at 80% of the code boost.
    pub fn test_file_boost(&self) -> f64 {
        self.code_file_boost * 0.8
    }
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

/// Engine-level tunables, resolved once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub ranking: RankingConfig,
    /// Functions spanning more than this many lines are treated as a
    /// parser error and context falls back to a small line window.
    pub max_function_lines: usize,
    /// Default per-file raw match cap. Lifted under `declaration_only`.
    pub per_file_match_cap: usize,
    /// Candidate count at which the automatic files-processed cap engages.
    pub auto_cap_threshold: usize,
    /// Files processed under the automatic cap.
    pub auto_cap_files: usize,
    /// Capacity of the compiled-regex LRU.
    pub regex_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ranking: RankingConfig::default(),
            max_function_lines: 500,
            per_file_match_cap: 100,
            auto_cap_threshold: 400,
            auto_cap_files: 25,
            regex_cache_size: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_plain_literal_search() {
        let opts = SearchOptions::default();
        assert!(!opts.use_regex);
        assert!(!opts.case_insensitive);
        assert!(opts.max_context_lines.is_none());
        assert!(!opts.has_semantic_filter());
        assert!(!opts.skip_comment_lines());
    }

    #[test]
    fn test_semantic_filter_detection() {
        let mut opts = SearchOptions::default();
        assert!(!opts.has_semantic_filter());
        opts.symbol_types.push("function".to_string());
        assert!(opts.has_semantic_filter());

        let opts = SearchOptions { exported_only: true, ..Default::default() };
        assert!(opts.has_semantic_filter());

        // Comment exclusion alone does not disable merging
        let opts = SearchOptions { exclude_comments: true, ..Default::default() };
        assert!(!opts.has_semantic_filter());
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());

        let opts = SearchOptions { cancel: Some(token), ..Default::default() };
        assert!(opts.is_cancelled());
        assert!(!SearchOptions::default().is_cancelled());
    }

    #[test]
    fn test_ranking_defaults() {
        let cfg = RankingConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.code_file_boost, 50.0);
        assert_eq!(cfg.test_file_boost(), 40.0);
        assert!(cfg.extension_weights.is_empty());
    }
}
