//! Match scoring and file classification.
//!
//! Scoring is pure: the same inputs always produce the same score, and the
//! final ordering uses a stable sort, so identical queries rank identically
//! across runs. Category weights come from `RankingConfig`; a per-extension
//! weight replaces the category contribution entirely.

use crate::filter::is_comment_line;
use crate::options::RankingConfig;
use crate::types::{EnhancedSymbol, GrepResult, SymbolType};
use memchr::memmem;

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

const SCORE_BASE: f64 = 10.0;
const SCORE_EXACT_WORD: f64 = 100.0;
const SCORE_DEFINITION_LINE: f64 = 1000.0;
const SCORE_SYMBOL_ON_LINE: f64 = 500.0;
const SCORE_CALLABLE_SYMBOL: f64 = 200.0;
const SCORE_NON_COMMENT: f64 = 1.0;
const SCORE_COMMENT_PENALTY: f64 = -5.0;
const SCORE_PATH_HIT: f64 = 3.0;
const SCORE_DEPTH_STEP: f64 = -0.5;
const REF_INCOMING_WEIGHT: f64 = 0.1;
const REF_OUTGOING_WEIGHT: f64 = 0.05;
const REF_BOOST_CAP: f64 = 10.0;
const SCORE_NO_SYMBOL_REQUIRED: f64 = -1000.0;

// ---------------------------------------------------------------------------
// File classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Code,
    Documentation,
    Config,
    Test,
    Unknown,
}

const CODE_EXTENSIONS: &[&str] = &[
    "go", "rs", "py", "js", "jsx", "ts", "tsx", "java", "c", "cpp", "cc", "cxx", "h", "hpp",
    "cs", "php", "rb", "swift", "kt", "scala", "lua", "pl", "pm", "r", "jl", "ex", "exs",
    "erl", "hrl", "hs", "clj", "cljs", "elm", "vue", "svelte", "zig", "nim", "v", "d", "m",
    "mm",
];

const DOC_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "rst", "adoc", "asciidoc", "rdoc", "org", "wiki", "textile",
    "pod", "rmd",
];

const CONFIG_EXTENSIONS: &[&str] = &[
    "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "xml", "kdl", "env", "properties",
];

fn is_test_file(basename: &str) -> bool {
    basename.contains("_test.")
        || basename.contains(".test.")
        || basename.contains(".spec.")
        || basename.starts_with("test_")
}

/// Classify a file by name: test files first, then by extension.
pub fn classify_file(rel_path: &str) -> FileCategory {
    let basename = rel_path.rsplit('/').next().unwrap_or(rel_path);
    if is_test_file(basename) {
        return FileCategory::Test;
    }
    let ext = basename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    if CODE_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Code
    } else if DOC_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Documentation
    } else if CONFIG_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Config
    } else {
        FileCategory::Unknown
    }
}

// ---------------------------------------------------------------------------
// Definition-line detection
// ---------------------------------------------------------------------------

const DEF_KEYWORDS: &[&str] = &["fn ", "func ", "def ", "function "];
const DEF_MODIFIERS: &[&str] = &[
    "pub ", "export ", "default ", "async ", "static ", "public ", "private ", "protected ",
    "unsafe ", "const ", "extern ",
];

/// Whether a line opens a function definition (after leading modifiers).
fn is_function_definition_line(line: &[u8]) -> bool {
    let text = String::from_utf8_lossy(line);
    let mut rest = text.trim_start();
    loop {
        let mut stripped = false;
        for modifier in DEF_MODIFIERS {
            if let Some(tail) = rest.strip_prefix(modifier) {
                rest = tail;
                stripped = true;
                break;
            }
        }
        if !stripped {
            break;
        }
    }
    DEF_KEYWORDS.iter().any(|kw| rest.starts_with(kw))
}

// ---------------------------------------------------------------------------
// Per-match scoring
// ---------------------------------------------------------------------------

pub(crate) struct ScoreInput<'a> {
    pub line_text: &'a [u8],
    pub exact: bool,
    pub query: &'a str,
    pub rel_path: &'a str,
    pub ext: &'a str,
    /// The symbol the query matched on this line, if any.
    pub symbol: Option<&'a EnhancedSymbol>,
    pub require_symbol: bool,
    pub ranking: &'a RankingConfig,
}

/// Accumulate the score for one match. Pure function of its inputs.
pub(crate) fn score_match(input: &ScoreInput) -> f64 {
    let mut score = SCORE_BASE;

    if input.exact {
        score += SCORE_EXACT_WORD;
    }

    if is_function_definition_line(input.line_text)
        && memmem::find(input.line_text, input.query.as_bytes()).is_some()
    {
        score += SCORE_DEFINITION_LINE;
    }

    if let Some(sym) = input.symbol {
        score += SCORE_SYMBOL_ON_LINE;
        if matches!(sym.kind, SymbolType::Function | SymbolType::Class) {
            score += SCORE_CALLABLE_SYMBOL;
        }
        let ref_boost = REF_INCOMING_WEIGHT * f64::from(sym.ref_stats.incoming)
            + REF_OUTGOING_WEIGHT * f64::from(sym.ref_stats.outgoing);
        score += ref_boost.min(REF_BOOST_CAP);
    }

    let trimmed_is_slash_comment = {
        let mut i = 0;
        while i < input.line_text.len()
            && (input.line_text[i] == b' ' || input.line_text[i] == b'\t')
        {
            i += 1;
        }
        input.line_text[i..].starts_with(b"//")
    };
    if trimmed_is_slash_comment {
        score += SCORE_COMMENT_PENALTY;
    }
    if !is_comment_line(input.line_text) {
        score += SCORE_NON_COMMENT;
    }

    let path_lower = input.rel_path.to_ascii_lowercase();
    let query_lower = input.query.to_ascii_lowercase();
    if !query_lower.is_empty() && path_lower.contains(&query_lower) {
        score += SCORE_PATH_HIT;
    }
    let depth = input.rel_path.matches('/').count();
    score += SCORE_DEPTH_STEP * depth as f64;

    if input.ranking.enabled {
        if let Some(&weight) = input.ranking.extension_weights.get(input.ext) {
            score += weight;
        } else {
            score += match classify_file(input.rel_path) {
                FileCategory::Code => input.ranking.code_file_boost,
                FileCategory::Documentation => input.ranking.doc_file_penalty,
                FileCategory::Config => input.ranking.config_file_boost,
                FileCategory::Test => input.ranking.test_file_boost(),
                FileCategory::Unknown => 0.0,
            };
        }

        if input.symbol.is_none() {
            if input.require_symbol || input.ranking.require_symbol {
                score += SCORE_NO_SYMBOL_REQUIRED;
            }
            if let Some(penalty) = input.ranking.non_symbol_penalty {
                score += penalty;
            }
        }
    }

    score
}

// ---------------------------------------------------------------------------
// Final ordering
// ---------------------------------------------------------------------------

/// Stable descending sort by score; ties keep insertion order so identical
/// queries return identical sequences.
pub(crate) fn sort_by_score(results: &mut [GrepResult]) {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
