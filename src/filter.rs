//! Per-match semantic predicates: symbol kind, declaration vs usage,
//! export/mutability/globality, and comment-line detection.
//!
//! All lookups go through the precomputed line -> symbols map, so the cost
//! per match is O(symbols on that line), not O(symbols in the file).

use crate::options::SearchOptions;
use crate::semantic::SemanticScorer;
use crate::types::{EnhancedSymbol, LineToSymbols, SymbolType, VariableKind};
use memchr::memmem;

// ---------------------------------------------------------------------------
// Line predicates
// ---------------------------------------------------------------------------

fn trim_start(line: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < line.len() && (line[i] == b' ' || line[i] == b'\t') {
        i += 1;
    }
    &line[i..]
}

/// A line is comment-like when its trimmed prefix opens a comment or it
/// closes a block comment.
pub(crate) fn is_comment_line(line: &[u8]) -> bool {
    let trimmed = trim_start(line);
    trimmed.starts_with(b"//")
        || trimmed.starts_with(b"#")
        || trimmed.starts_with(b"/*")
        || memmem::find(line, b"*/").is_some()
}

fn line_contains(line: &[u8], needle: &[u8]) -> bool {
    memmem::find(line, needle).is_some()
}

fn has_leading_whitespace(line: &[u8]) -> bool {
    matches!(line.first(), Some(b' ') | Some(b'\t'))
}

// ---------------------------------------------------------------------------
// Symbol lookup
// ---------------------------------------------------------------------------

/// Borrowed view of one file's symbol data, built once per file per query.
#[derive(Clone, Copy)]
pub(crate) struct SymbolLookup<'a> {
    pub symbols: &'a [EnhancedSymbol],
    pub line_map: &'a LineToSymbols,
}

impl<'a> SymbolLookup<'a> {
    /// Symbols declared exactly on a 1-based line.
    pub fn symbols_on_line(&self, line: usize) -> impl Iterator<Item = &'a EnhancedSymbol> + '_ {
        self.line_map
            .get(&line)
            .into_iter()
            .flatten()
            .filter_map(move |&idx| self.symbols.get(idx))
    }

    /// The symbol on a line that best matches the query: the first whose
    /// name scores at or above the scorer's threshold, else the first
    /// symbol declared on the line.
    pub fn matching_symbol(
        &self,
        line: usize,
        query: &str,
        scorer: &dyn SemanticScorer,
    ) -> Option<&'a EnhancedSymbol> {
        let mut first = None;
        for sym in self.symbols_on_line(line) {
            if first.is_none() {
                first = Some(sym);
            }
            if scorer.score(query, &sym.name) >= scorer.min_score() {
                return Some(sym);
            }
        }
        first
    }
}

// ---------------------------------------------------------------------------
// Predicate evaluation
// ---------------------------------------------------------------------------

fn is_exported(sym: &EnhancedSymbol, line: &[u8]) -> bool {
    if let Some(flag) = sym.is_exported {
        return flag;
    }
    sym.name.as_bytes().first().is_some_and(u8::is_ascii_uppercase)
        || line_contains(line, b"export ")
        || line_contains(line, b"public ")
        || line_contains(line, b"pub ")
}

fn is_mutable(sym: &EnhancedSymbol, line: &[u8]) -> bool {
    if let Some(flag) = sym.is_mutable {
        return flag;
    }
    sym.kind == SymbolType::Variable
        && (line_contains(line, b"var ") || line_contains(line, b"let "))
        && !line_contains(line, b"const ")
        && !line_contains(line, b"final ")
}

fn is_global(sym: &EnhancedSymbol, line: &[u8]) -> bool {
    sym.variable_kind == Some(VariableKind::Global) || !has_leading_whitespace(line)
}

/// Decide whether a match on `line` (1-based, text given) survives the
/// semantic options. Returns the decision together with the symbol the
/// query matched on that line, for reuse by the scorer.
pub(crate) fn passes_semantic_filters<'a>(
    line_text: &[u8],
    line: usize,
    query: &str,
    options: &SearchOptions,
    lookup: Option<SymbolLookup<'a>>,
    scorer: &dyn SemanticScorer,
) -> (bool, Option<&'a EnhancedSymbol>) {
    let comment_line = is_comment_line(line_text);
    if options.skip_comment_lines() && comment_line {
        return (false, None);
    }
    if options.comments_only && !comment_line {
        return (false, None);
    }

    let matched = lookup.and_then(|l| l.matching_symbol(line, query, scorer));

    if !options.symbol_types.is_empty() {
        let ok = matched.is_some_and(|sym| {
            options.symbol_types.iter().any(|t| t.eq_ignore_ascii_case(sym.kind.label()))
        });
        if !ok {
            return (false, matched);
        }
    }

    if options.declaration_only && matched.is_none() {
        return (false, None);
    }
    if options.usage_only && matched.is_some() {
        return (false, matched);
    }

    if options.exported_only {
        let ok = matched.is_some_and(|sym| is_exported(sym, line_text));
        if !ok {
            return (false, matched);
        }
    }
    if options.mutable_only {
        let ok = matched.is_some_and(|sym| is_mutable(sym, line_text));
        if !ok {
            return (false, matched);
        }
    }
    if options.global_only {
        let ok = matched.is_some_and(|sym| is_global(sym, line_text));
        if !ok {
            return (false, matched);
        }
    }

    (true, matched)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
