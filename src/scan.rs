//! Byte scanners for a single file's content.
//!
//! Literal scanning is a forward memmem sweep that reports *overlapping*
//! occurrences (the cursor advances one byte past each match start), so
//! `"aa"` occurs twice in `"aaa"`. Regex scanning always compiles with
//! multiline semantics upstream, so `^`/`$` bind to line boundaries here.

use crate::types::Match;
use memchr::memmem;
use memchr::memrchr;
use regex::bytes::Regex;

/// Metacharacters that make a pattern a "real" regex. Patterns without any
/// of these are downgraded to literal scans.
const REGEX_METACHARS: &[char] =
    &['.', '*', '+', '?', '[', ']', '(', ')', '|', '^', '$', '\\', '{', '}'];

pub fn has_regex_metachars(pattern: &str) -> bool {
    pattern.contains(REGEX_METACHARS)
}

/// Rewrite a literal pattern as a word-bounded regex.
pub fn word_boundary_pattern(pattern: &str) -> String {
    format!(r"\b{}\b", regex::escape(pattern))
}

// ---------------------------------------------------------------------------
// Word-boundary exactness
// ---------------------------------------------------------------------------

#[inline]
pub(crate) fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// A match is exact when both neighbors of the range are non-word bytes
/// (or the range touches the buffer edge).
pub(crate) fn match_exactness(content: &[u8], start: usize, end: usize) -> bool {
    let left_ok = start == 0 || !is_word_byte(content[start - 1]);
    let right_ok = end >= content.len() || !is_word_byte(content[end]);
    left_ok && right_ok
}

// ---------------------------------------------------------------------------
// Comment-line detection at the byte level
// ---------------------------------------------------------------------------

/// Whether the line containing `offset` starts with `//` after left-trimming
/// spaces and tabs. Used by the literal scanner's comment exclusion.
pub(crate) fn offset_on_comment_line(content: &[u8], offset: usize) -> bool {
    let line_start = memrchr(b'\n', &content[..offset]).map_or(0, |nl| nl + 1);
    let mut i = line_start;
    while i < content.len() && (content[i] == b' ' || content[i] == b'\t') {
        i += 1;
    }
    content[i..].starts_with(b"//")
}

// ---------------------------------------------------------------------------
// Literal scan
// ---------------------------------------------------------------------------

/// Options for one literal sweep over a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralScan {
    pub case_insensitive: bool,
    pub exclude_comments: bool,
    /// Stop after this many reported matches. `None` = unbounded.
    pub max_matches: Option<usize>,
}

/// Find all (overlapping) occurrences of `pattern` in `content`.
///
/// Case-insensitive scans lowercase both sides once into scratch buffers;
/// offsets map one-to-one back to the original bytes, and exactness is
/// judged on the original content.
pub fn literal_matches(content: &[u8], pattern: &[u8], opts: &LiteralScan) -> Vec<Match> {
    if pattern.is_empty() || pattern.len() > content.len() {
        return Vec::new();
    }

    let (hay_buf, needle_buf);
    let (hay, needle): (&[u8], &[u8]) = if opts.case_insensitive {
        hay_buf = content.to_ascii_lowercase();
        needle_buf = pattern.to_ascii_lowercase();
        (&hay_buf, &needle_buf)
    } else {
        (content, pattern)
    };

    let finder = memmem::Finder::new(needle);
    let mut matches = Vec::new();
    let mut pos = 0usize;
    while let Some(found) = finder.find(&hay[pos..]) {
        let start = pos + found;
        let end = start + needle.len();
        pos = start + 1;
        if opts.exclude_comments && offset_on_comment_line(content, start) {
            continue;
        }
        matches.push(Match { start, end, exact: match_exactness(content, start, end) });
        if opts.max_matches.is_some_and(|cap| matches.len() >= cap) {
            break;
        }
    }
    matches
}

// ---------------------------------------------------------------------------
// Regex scan
// ---------------------------------------------------------------------------

/// Find regex matches over a file's bytes. The regex is already compiled
/// with multiline (and optionally case-insensitive) flags.
pub fn regex_matches(content: &[u8], re: &Regex, max_matches: Option<usize>) -> Vec<Match> {
    let mut matches = Vec::new();
    for m in re.find_iter(content) {
        // Zero-width matches (bare anchors) carry no text to return
        if m.start() == m.end() {
            continue;
        }
        matches.push(Match {
            start: m.start(),
            end: m.end(),
            exact: match_exactness(content, m.start(), m.end()),
        });
        if max_matches.is_some_and(|cap| matches.len() >= cap) {
            break;
        }
    }
    matches
}

// ---------------------------------------------------------------------------
// Unified per-line matcher
// ---------------------------------------------------------------------------

/// One compiled pattern, usable for per-line predicates (invert match) and
/// full-content sweeps.
pub(crate) enum PatternMatcher {
    Literal { needle: Vec<u8>, case_insensitive: bool },
    Regex(std::sync::Arc<Regex>),
}

impl PatternMatcher {
    pub fn line_is_match(&self, line: &[u8]) -> bool {
        match self {
            PatternMatcher::Literal { needle, case_insensitive } => {
                if *case_insensitive {
                    let hay = line.to_ascii_lowercase();
                    memmem::find(&hay, needle).is_some()
                } else {
                    memmem::find(line, needle).is_some()
                }
            }
            PatternMatcher::Regex(re) => re.is_match(line),
        }
    }
}

/// Return a whole-line match range for every line *without* a pattern hit.
pub(crate) fn invert_matches(
    content: &[u8],
    matcher: &PatternMatcher,
    max_matches: Option<usize>,
) -> Vec<Match> {
    let mut matches = Vec::new();
    let mut start = 0usize;
    loop {
        let rest = &content[start..];
        let line_end = memchr::memchr(b'\n', rest).map_or(content.len(), |nl| start + nl);
        let line = &content[start..line_end];
        if !matcher.line_is_match(line) {
            matches.push(Match { start, end: line_end, exact: false });
            if max_matches.is_some_and(|cap| matches.len() >= cap) {
                break;
            }
        }
        if line_end >= content.len() {
            break;
        }
        start = line_end + 1;
        if start >= content.len() {
            break;
        }
    }
    matches
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
