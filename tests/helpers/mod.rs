//! In-memory index fixture for engine integration tests.
//!
//! `FileSpec` describes a file declaratively; `TestIndex::build` assigns
//! ids, computes offset tables and the line -> symbols map, and implements
//! the full read contract plus the optional capabilities.

#![allow(dead_code)]

use grepscope::{
    BlockBoundary, BlockKind, CandidateProvider, DeletedFilter, EnhancedSymbol, FileId, FileInfo,
    Index, LineToSymbols, RefStats, SymbolId, SymbolType, VariableKind,
};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Declarative file spec
// ---------------------------------------------------------------------------

pub struct SymbolSpec {
    name: String,
    kind: SymbolType,
    line: usize,
    end_line: usize,
    is_exported: Option<bool>,
    is_mutable: Option<bool>,
    variable_kind: Option<VariableKind>,
    incoming: u32,
    outgoing: u32,
}

pub struct FileSpec {
    path: String,
    content: String,
    blocks: Vec<BlockBoundary>,
    symbols: Vec<SymbolSpec>,
}

impl FileSpec {
    pub fn new(path: &str, content: &str) -> Self {
        Self {
            path: path.to_string(),
            content: content.to_string(),
            blocks: Vec::new(),
            symbols: Vec::new(),
        }
    }

    /// Add a block boundary in 0-based inclusive line indices.
    pub fn block(mut self, kind: BlockKind, name: &str, start0: usize, end0: usize) -> Self {
        self.blocks.push(BlockBoundary { kind, name: name.to_string(), start: start0, end: end0 });
        self
    }

    /// Add a symbol declared on a 1-based line.
    pub fn symbol(self, name: &str, kind: SymbolType, line: usize) -> Self {
        self.symbol_span(name, kind, line, line)
    }

    pub fn symbol_span(
        mut self,
        name: &str,
        kind: SymbolType,
        line: usize,
        end_line: usize,
    ) -> Self {
        self.symbols.push(SymbolSpec {
            name: name.to_string(),
            kind,
            line,
            end_line,
            is_exported: None,
            is_mutable: None,
            variable_kind: None,
            incoming: 0,
            outgoing: 0,
        });
        self
    }

    /// Add a symbol carrying reference-graph counts.
    pub fn symbol_refs(
        mut self,
        name: &str,
        kind: SymbolType,
        line: usize,
        incoming: u32,
        outgoing: u32,
    ) -> Self {
        self.symbols.push(SymbolSpec {
            name: name.to_string(),
            kind,
            line,
            end_line: line,
            is_exported: None,
            is_mutable: None,
            variable_kind: None,
            incoming,
            outgoing,
        });
        self
    }

    /// Override flags on the most recently added symbol.
    pub fn exported(mut self, flag: bool) -> Self {
        if let Some(last) = self.symbols.last_mut() {
            last.is_exported = Some(flag);
        }
        self
    }

    pub fn mutable(mut self, flag: bool) -> Self {
        if let Some(last) = self.symbols.last_mut() {
            last.is_mutable = Some(flag);
        }
        self
    }

    pub fn variable_kind(mut self, kind: VariableKind) -> Self {
        if let Some(last) = self.symbols.last_mut() {
            last.variable_kind = Some(kind);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Built index
// ---------------------------------------------------------------------------

struct TestFile {
    info: FileInfo,
    content: Vec<u8>,
    offsets: Vec<u32>,
    blocks: Vec<BlockBoundary>,
    symbols: Vec<EnhancedSymbol>,
    line_map: LineToSymbols,
}

pub struct TestIndex {
    files: Vec<TestFile>,
    symbol_locations: HashMap<SymbolId, (usize, usize)>,
    deleted: Vec<FileId>,
    candidate_override: Option<Vec<FileId>>,
}

impl TestIndex {
    pub fn build(specs: Vec<FileSpec>) -> Self {
        let mut files = Vec::with_capacity(specs.len());
        let mut symbol_locations = HashMap::new();
        let mut next_symbol = 0u32;

        for (file_idx, spec) in specs.into_iter().enumerate() {
            let id = FileId(file_idx as u32);
            let ext = spec
                .path
                .rsplit('/')
                .next()
                .and_then(|base| base.rsplit_once('.'))
                .map(|(_, e)| e.to_ascii_lowercase())
                .unwrap_or_default();
            let info = FileInfo {
                id,
                path: format!("/project/{}", spec.path),
                rel_path: spec.path.clone(),
                ext,
            };

            let content = spec.content.into_bytes();
            let offsets = grepscope::build_line_offsets(&content);

            let mut symbols = Vec::with_capacity(spec.symbols.len());
            let mut line_map: LineToSymbols = HashMap::new();
            for (sym_idx, s) in spec.symbols.into_iter().enumerate() {
                let sym_id = SymbolId(next_symbol);
                next_symbol += 1;
                symbol_locations.insert(sym_id, (file_idx, sym_idx));
                line_map.entry(s.line).or_default().push(sym_idx);
                symbols.push(EnhancedSymbol {
                    id: sym_id,
                    file_id: id,
                    name: s.name,
                    kind: s.kind,
                    line: s.line,
                    end_line: s.end_line,
                    is_exported: s.is_exported,
                    is_mutable: s.is_mutable,
                    variable_kind: s.variable_kind,
                    incoming_refs: Vec::new(),
                    outgoing_refs: Vec::new(),
                    ref_stats: RefStats { incoming: s.incoming, outgoing: s.outgoing },
                });
            }

            files.push(TestFile {
                info,
                content,
                offsets,
                blocks: spec.blocks,
                symbols,
                line_map,
            });
        }

        Self { files, symbol_locations, deleted: Vec::new(), candidate_override: None }
    }

    pub fn id_of(&self, path: &str) -> FileId {
        self.files
            .iter()
            .find(|f| f.info.rel_path == path)
            .map(|f| f.info.id)
            .unwrap_or_else(|| panic!("no fixture file named {path}"))
    }

    pub fn content_of(&self, id: FileId) -> &[u8] {
        &self.files[id.0 as usize].content
    }

    /// Mark a file as deleted; enables the deleted-filter capability.
    pub fn with_deleted(mut self, path: &str) -> Self {
        let id = self.id_of(path);
        self.deleted.push(id);
        self
    }

    /// Force the candidate-provider capability to return exactly these
    /// files for every lookup.
    pub fn with_candidate_override(mut self, paths: &[&str]) -> Self {
        let ids = paths.iter().map(|p| self.id_of(p)).collect();
        self.candidate_override = Some(ids);
        self
    }

    fn file(&self, id: FileId) -> Option<&TestFile> {
        self.files.get(id.0 as usize)
    }
}

impl Index for TestIndex {
    fn all_file_ids(&self) -> Vec<FileId> {
        self.files.iter().map(|f| f.info.id).collect()
    }

    fn file_info(&self, id: FileId) -> Option<&FileInfo> {
        self.file(id).map(|f| &f.info)
    }

    fn file_content(&self, id: FileId) -> Option<&[u8]> {
        self.file(id).map(|f| f.content.as_slice())
    }

    fn file_line_offsets(&self, id: FileId) -> Option<&[u32]> {
        self.file(id).map(|f| f.offsets.as_slice())
    }

    fn file_blocks(&self, id: FileId) -> Option<&[BlockBoundary]> {
        self.file(id).map(|f| f.blocks.as_slice())
    }

    fn file_enhanced_symbols(&self, id: FileId) -> Option<&[EnhancedSymbol]> {
        self.file(id).map(|f| f.symbols.as_slice())
    }

    fn file_line_to_symbols(&self, id: FileId) -> Option<&LineToSymbols> {
        self.file(id).map(|f| &f.line_map)
    }

    fn enhanced_symbol(&self, id: SymbolId) -> Option<&EnhancedSymbol> {
        let &(file_idx, sym_idx) = self.symbol_locations.get(&id)?;
        self.files.get(file_idx)?.symbols.get(sym_idx)
    }

    fn candidate_provider(&self) -> Option<&dyn CandidateProvider> {
        self.candidate_override.as_ref().map(|_| self as &dyn CandidateProvider)
    }

    fn deleted_filter(&self) -> Option<&dyn DeletedFilter> {
        if self.deleted.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl CandidateProvider for TestIndex {
    fn find_candidate_files(&self, _pattern: &str, _case_insensitive: bool) -> Vec<FileId> {
        self.candidate_override.clone().unwrap_or_default()
    }
}

impl DeletedFilter for TestIndex {
    fn filter_deleted(&self, ids: Vec<FileId>) -> Vec<FileId> {
        ids.into_iter().filter(|id| !self.deleted.contains(id)).collect()
    }
}

// ---------------------------------------------------------------------------
// Canned fixtures
// ---------------------------------------------------------------------------

/// The arithmetic fixture: a definition and a usage of `CalculateSum`.
pub fn sum_fixture() -> TestIndex {
    let content = "package main\n\nfunc CalculateSum(a, b int) int {\n\treturn a + b\n}\n\nfunc main() { x := CalculateSum(1, 2); _ = x }\n";
    TestIndex::build(vec![FileSpec::new("a.go", content)
        .block(BlockKind::Function, "CalculateSum", 2, 4)
        .block(BlockKind::Function, "main", 6, 6)
        .symbol_span("CalculateSum", SymbolType::Function, 3, 5)
        .symbol("main", SymbolType::Function, 7)])
}
