//! Candidate file selection: trigram pruning, deleted-file filtering, and
//! include/exclude path filters.
//!
//! Path filters accept comma-separated sub-patterns. A sub-pattern
//! containing glob metacharacters is converted to an anchored regex
//! (`**` -> `.*`, `*` -> `[^/]*`, `?` -> `[^/]`); one without them is
//! compiled as a plain regex with search semantics, so `src/` keeps its
//! natural prefix meaning. Sub-patterns are alternatives: any hit counts.
//! An invalid include pattern yields zero candidates (fail-closed); an
//! invalid exclude pattern leaves the list unchanged (fail-open).

use crate::error::EngineError;
use crate::index::{Capabilities, Index};
use crate::options::SearchOptions;
use crate::types::FileId;
use regex::Regex;
use tracing::debug;

// ---------------------------------------------------------------------------
// Glob conversion
// ---------------------------------------------------------------------------

fn has_glob_metachars(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// Convert one glob sub-pattern into an anchored regex source string.
fn glob_to_regex_str(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');
    let bytes = glob.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if bytes.get(i + 1) == Some(&b'*') {
                    out.push_str(".*");
                    i += 2;
                    continue;
                }
                out.push_str("[^/]*");
            }
            b'?' => out.push_str("[^/]"),
            c => {
                let ch = c as char;
                if ch.is_ascii_alphanumeric() || ch == '/' || ch == '_' || ch == '-' {
                    out.push(ch);
                } else {
                    out.push('\\');
                    out.push(ch);
                }
            }
        }
        i += 1;
    }
    // A trailing slash means "everything under this directory"
    if glob.ends_with('/') {
        out.push_str(".*");
    }
    out.push('$');
    out
}

/// One compiled sub-pattern of an include/exclude filter.
struct CompiledPattern {
    re: Regex,
    /// Glob sub-patterns without a `/` also match the basename alone.
    match_basename: bool,
}

impl CompiledPattern {
    fn matches(&self, rel_path: &str, abs_path: &str) -> bool {
        if self.re.is_match(rel_path) || self.re.is_match(abs_path) {
            return true;
        }
        if self.match_basename {
            let base = rel_path.rsplit('/').next().unwrap_or(rel_path);
            return self.re.is_match(base);
        }
        false
    }
}

fn compile_filter(input: &str) -> Result<Vec<CompiledPattern>, EngineError> {
    let mut compiled = Vec::new();
    for sub in input.split(',') {
        let sub = sub.trim();
        if sub.is_empty() {
            continue;
        }
        let (source, match_basename) = if has_glob_metachars(sub) {
            (glob_to_regex_str(sub), !sub.contains('/'))
        } else {
            (sub.to_string(), false)
        };
        let re = Regex::new(&source).map_err(|e| EngineError::InvalidGlob {
            pattern: sub.to_string(),
            detail: e.to_string(),
        })?;
        compiled.push(CompiledPattern { re, match_basename });
    }
    Ok(compiled)
}

// ---------------------------------------------------------------------------
// Path filter
// ---------------------------------------------------------------------------

/// Compiled include/exclude filters plus any soft errors hit while building.
pub(crate) struct PathFilter {
    include: Option<Vec<CompiledPattern>>,
    exclude: Option<Vec<CompiledPattern>>,
    /// Fail-closed marker: the include pattern was invalid.
    include_invalid: bool,
    pub errors: Vec<EngineError>,
}

impl PathFilter {
    pub fn build(include: Option<&str>, exclude: Option<&str>) -> Self {
        let mut errors = Vec::new();
        let mut include_invalid = false;

        let include = include.filter(|p| !p.trim().is_empty()).and_then(|p| {
            match compile_filter(p) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    include_invalid = true;
                    errors.push(e);
                    None
                }
            }
        });
        let exclude = exclude.filter(|p| !p.trim().is_empty()).and_then(|p| {
            match compile_filter(p) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    errors.push(e);
                    None
                }
            }
        });

        Self { include, exclude, include_invalid, errors }
    }

    pub fn accepts(&self, rel_path: &str, abs_path: &str) -> bool {
        if self.include_invalid {
            return false;
        }
        if let Some(include) = &self.include {
            if !include.iter().any(|p| p.matches(rel_path, abs_path)) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.iter().any(|p| p.matches(rel_path, abs_path)) {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Candidate resolution
// ---------------------------------------------------------------------------

pub(crate) struct CandidateResolution {
    pub ids: Vec<FileId>,
    pub errors: Vec<EngineError>,
}

/// Resolve the set of file ids a query will scan.
pub(crate) fn resolve_candidates(
    index: &dyn Index,
    caps: Capabilities,
    pattern: &str,
    explicit: &[FileId],
    effective_regex: bool,
    options: &SearchOptions,
) -> CandidateResolution {
    let pruned = if explicit.is_empty() && !effective_regex && pattern.len() >= 3 && caps.has_candidates
    {
        index.candidate_provider().map(|p| p.find_candidate_files(pattern, options.case_insensitive))
    } else {
        None
    };
    let mut ids: Vec<FileId> = if !explicit.is_empty() {
        explicit.to_vec()
    } else if let Some(pruned) = pruned {
        debug!(candidates = pruned.len(), "trigram pruning applied");
        pruned
    } else {
        index.all_file_ids()
    };

    if caps.has_deleted_filter {
        if let Some(filter) = index.deleted_filter() {
            ids = filter.filter_deleted(ids);
        }
    }

    let path_filter =
        PathFilter::build(options.include_pattern.as_deref(), options.exclude_pattern.as_deref());
    let filtered: Vec<FileId> = ids
        .into_iter()
        .filter(|&id| match index.file_info(id) {
            Some(info) => path_filter.accepts(&info.rel_path, &info.path),
            None => false,
        })
        .collect();

    CandidateResolution { ids: filtered, errors: path_filter.errors }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
