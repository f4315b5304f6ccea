use serde::Serialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable identifier for a file within one index session. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileId(pub u32);

/// Stable identifier for an enhanced symbol within one index session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SymbolId(pub u32);

// ---------------------------------------------------------------------------
// Raw matches
// ---------------------------------------------------------------------------

/// A byte range inside one file's content.
///
/// `exact` is set when both neighbors of the range are non-word bytes
/// (word byte = `[A-Za-z0-9_]`), i.e. the match is a whole word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub exact: bool,
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// The kind of syntactic block a context was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Function,
    Method,
    Struct,
    Interface,
    Class,
    /// A plain line window with no block semantics (fallbacks, line mode).
    Lines,
    /// A merged multi-match window that is not a single function.
    Context,
}

impl BlockKind {
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Function => "function",
            BlockKind::Method => "method",
            BlockKind::Struct => "struct",
            BlockKind::Interface => "interface",
            BlockKind::Class => "class",
            BlockKind::Lines => "lines",
            BlockKind::Context => "context",
        }
    }

    pub fn is_function_like(&self) -> bool {
        matches!(self, BlockKind::Function | BlockKind::Method)
    }
}

/// A block boundary produced by the index's parser, in 0-based line indices
/// (inclusive). Blocks may nest; the containing block of a line is the
/// smallest enclosing one.
#[derive(Debug, Clone, Serialize)]
pub struct BlockBoundary {
    pub kind: BlockKind,
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl BlockBoundary {
    /// Number of lines the block spans.
    pub fn span(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    /// Whether a 0-based line falls inside the block.
    pub fn contains_line0(&self, line0: usize) -> bool {
        line0 >= self.start && line0 <= self.end
    }
}

// ---------------------------------------------------------------------------
// Enhanced symbols
// ---------------------------------------------------------------------------

/// The kind of a symbol declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolType {
    Function,
    Method,
    Class,
    Interface,
    Type,
    Variable,
    Constant,
    Field,
}

impl SymbolType {
    pub fn label(&self) -> &'static str {
        match self {
            SymbolType::Function => "function",
            SymbolType::Method => "method",
            SymbolType::Class => "class",
            SymbolType::Interface => "interface",
            SymbolType::Type => "type",
            SymbolType::Variable => "variable",
            SymbolType::Constant => "constant",
            SymbolType::Field => "field",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "function" => Some(SymbolType::Function),
            "method" => Some(SymbolType::Method),
            "class" => Some(SymbolType::Class),
            "interface" => Some(SymbolType::Interface),
            "type" => Some(SymbolType::Type),
            "variable" => Some(SymbolType::Variable),
            "constant" => Some(SymbolType::Constant),
            "field" => Some(SymbolType::Field),
            _ => None,
        }
    }
}

/// Where a variable symbol lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Local,
    Global,
    Parameter,
    Field,
}

/// Aggregate reference counts for a symbol.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RefStats {
    pub incoming: u32,
    pub outgoing: u32,
}

/// A symbol record augmented with export/mutability flags and reference
/// graph edges. Owned by the index; the engine only reads it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedSymbol {
    pub id: SymbolId,
    pub file_id: FileId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolType,
    /// 1-based declaration line.
    pub line: usize,
    /// 1-based end line (inclusive).
    pub end_line: usize,
    pub is_exported: Option<bool>,
    pub is_mutable: Option<bool>,
    pub variable_kind: Option<VariableKind>,
    pub incoming_refs: Vec<SymbolId>,
    pub outgoing_refs: Vec<SymbolId>,
    pub ref_stats: RefStats,
}

impl EnhancedSymbol {
    /// Whether a 1-based line falls within the symbol's declared range.
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.line && line <= self.end_line.max(self.line)
    }
}

/// Map from 1-based line number to indices into the file's symbol slice.
/// Enables O(1) symbol lookup per match.
pub type LineToSymbols = HashMap<usize, Vec<usize>>;

// ---------------------------------------------------------------------------
// File info and scopes
// ---------------------------------------------------------------------------

/// Identity and path metadata for one indexed file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub id: FileId,
    /// Absolute path.
    pub path: String,
    /// Path relative to the project root, `/`-separated.
    pub rel_path: String,
    /// Extension without the leading dot, lowercased.
    pub ext: String,
}

/// The enclosing scope of a line, attached to detailed results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeInfo {
    pub kind: BlockKind,
    pub name: String,
    /// 1-based.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
}

// ---------------------------------------------------------------------------
// Extracted context
// ---------------------------------------------------------------------------

/// A bounded window of lines around one or more matches.
///
/// Invariants: `lines.len() == end_line - start_line + 1`,
/// every matched line falls in `[start_line, end_line]`, and
/// `match_count >= matched_lines.len()`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContext {
    /// 1-based first line of the window.
    pub start_line: usize,
    /// 1-based last line of the window (inclusive).
    pub end_line: usize,
    pub lines: Vec<String>,
    pub block_type: BlockKind,
    pub block_name: String,
    /// Whether the window covers the complete enclosing block.
    pub is_complete: bool,
    /// Distinct 1-based lines that contain at least one match, sorted.
    pub matched_lines: Vec<usize>,
    /// Total number of match byte ranges represented by this window.
    pub match_count: usize,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One ranked search result.
///
/// `line` is 1-based; `column` is a 0-based byte offset from the start of
/// the line. `context` is absent for files-only and count-per-file output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrepResult {
    pub file_id: FileId,
    pub path: String,
    pub line: usize,
    pub column: usize,
    pub match_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ExtractedContext>,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_match_count: Option<usize>,
}

/// Dense ids for consumers that key results by object rather than path.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectIds {
    pub file_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_id: Option<u32>,
}

/// A `GrepResult` enriched with relational data: the symbol declared on the
/// match line (if any) and the enclosing scope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardResult {
    #[serde(flatten)]
    pub result: GrepResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_id: Option<SymbolId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_ids: Option<ObjectIds>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
