//! Read-only contract between the engine and the index that feeds it.
//!
//! The engine never mutates index state and assumes the accessors are safe
//! for concurrent readers. Optional capabilities (trigram candidate lookup,
//! deleted-file filtering, engine configuration) are probed once at engine
//! construction and remembered in a small capability snapshot.

use crate::options::EngineConfig;
use crate::types::{
    BlockBoundary, EnhancedSymbol, FileId, FileInfo, LineToSymbols, ScopeInfo, SymbolId,
};

// ---------------------------------------------------------------------------
// Optional capabilities
// ---------------------------------------------------------------------------

/// Trigram-based candidate pruning: returns only files containing every
/// 3-byte substring of the pattern. Consulted for literal patterns >= 3
/// bytes when the caller did not supply an explicit candidate set.
pub trait CandidateProvider {
    fn find_candidate_files(&self, pattern: &str, case_insensitive: bool) -> Vec<FileId>;
}

/// Drops ids whose files have been deleted since indexing.
pub trait DeletedFilter {
    fn filter_deleted(&self, ids: Vec<FileId>) -> Vec<FileId>;
}

/// Supplies engine configuration (ranking weights, caps) from the index.
pub trait ConfigProvider {
    fn engine_config(&self) -> EngineConfig;
}

// ---------------------------------------------------------------------------
// Index contract
// ---------------------------------------------------------------------------

/// Everything the engine consumes. Line numbers are 1-based throughout;
/// block boundaries are the one exception (0-based, converted once in
/// context extraction).
pub trait Index: Send + Sync {
    fn all_file_ids(&self) -> Vec<FileId>;

    fn file_info(&self, id: FileId) -> Option<&FileInfo>;

    /// The file's immutable content bytes.
    fn file_content(&self, id: FileId) -> Option<&[u8]>;

    fn file_path(&self, id: FileId) -> Option<&str> {
        self.file_info(id).map(|info| info.rel_path.as_str())
    }

    /// Line-start byte offsets with a final sentinel equal to the content
    /// length, so line `i` (1-based) spans `offsets[i-1]..offsets[i]`.
    /// `None` when the index did not precompute offsets for this file.
    fn file_line_offsets(&self, id: FileId) -> Option<&[u32]>;

    fn file_line_count(&self, id: FileId) -> Option<usize> {
        self.file_line_offsets(id).map(|offsets| offsets.len().saturating_sub(1))
    }

    /// One 1-based line without its trailing newline. The default reads
    /// through the offset table; indexes with their own line storage can
    /// override.
    fn file_line(&self, id: FileId, line: usize) -> Option<&[u8]> {
        let content = self.file_content(id)?;
        let offsets = self.file_line_offsets(id)?;
        if line == 0 || line >= offsets.len() {
            return None;
        }
        let start = offsets[line - 1] as usize;
        let mut end = offsets[line] as usize;
        if end > start && content.get(end - 1) == Some(&b'\n') {
            end -= 1;
        }
        if end > start && content.get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        content.get(start..end)
    }

    /// Inclusive 1-based line range; out-of-range lines are skipped.
    fn file_lines(&self, id: FileId, start: usize, end: usize) -> Vec<&[u8]> {
        (start..=end).filter_map(|n| self.file_line(id, n)).collect()
    }

    /// Block boundaries (functions, methods, structs, …) for the file.
    fn file_blocks(&self, id: FileId) -> Option<&[BlockBoundary]>;

    fn file_enhanced_symbols(&self, id: FileId) -> Option<&[EnhancedSymbol]>;

    /// 1-based line -> indices into `file_enhanced_symbols(id)`.
    fn file_line_to_symbols(&self, id: FileId) -> Option<&LineToSymbols>;

    /// Enclosing scope of a 1-based line.
    fn file_scope_info(&self, id: FileId, line: usize) -> Option<ScopeInfo> {
        let blocks = self.file_blocks(id)?;
        let line0 = line.checked_sub(1)?;
        blocks
            .iter()
            .filter(|b| b.contains_line0(line0))
            .min_by_key(|b| b.span())
            .map(|b| ScopeInfo {
                kind: b.kind,
                name: b.name.clone(),
                start_line: b.start + 1,
                end_line: b.end + 1,
            })
    }

    fn enhanced_symbol(&self, id: SymbolId) -> Option<&EnhancedSymbol>;

    /// The symbol declared exactly on a 1-based line, if any.
    fn enhanced_symbol_at_line(&self, id: FileId, line: usize) -> Option<&EnhancedSymbol> {
        let symbols = self.file_enhanced_symbols(id)?;
        let map = self.file_line_to_symbols(id)?;
        map.get(&line)?.first().and_then(|&idx| symbols.get(idx))
    }

    /// The smallest symbol whose declared range contains a 1-based line.
    fn symbol_at_line(&self, id: FileId, line: usize) -> Option<&EnhancedSymbol> {
        let symbols = self.file_enhanced_symbols(id)?;
        symbols
            .iter()
            .filter(|s| s.contains_line(line))
            .min_by_key(|s| s.end_line.max(s.line) - s.line)
    }

    // -- optional capabilities ---------------------------------------------

    fn candidate_provider(&self) -> Option<&dyn CandidateProvider> {
        None
    }

    fn deleted_filter(&self) -> Option<&dyn DeletedFilter> {
        None
    }

    fn config_provider(&self) -> Option<&dyn ConfigProvider> {
        None
    }
}

// ---------------------------------------------------------------------------
// Capability snapshot
// ---------------------------------------------------------------------------

/// Which optional capabilities the index offered at construction time.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Capabilities {
    pub has_candidates: bool,
    pub has_deleted_filter: bool,
}

impl Capabilities {
    pub fn probe(index: &dyn Index) -> Self {
        Self {
            has_candidates: index.candidate_provider().is_some(),
            has_deleted_filter: index.deleted_filter().is_some(),
        }
    }
}
