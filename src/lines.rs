//! Offset <-> line mapping over a file's bytes.
//!
//! The offset table is a strictly increasing sequence of line-start byte
//! offsets with `offsets[0] == 0` and a final sentinel equal to the content
//! length, so line `i` (1-based) spans `offsets[i-1]..offsets[i]` and the
//! line count is `offsets.len() - 1`. Index-supplied tables are borrowed;
//! files missing offsets get a single-pass scan.

use memchr::memchr_iter;
use std::borrow::Cow;

// ---------------------------------------------------------------------------
// Offset table construction
// ---------------------------------------------------------------------------

/// Build the sentinel-terminated offset table for `content`.
pub fn build_line_offsets(content: &[u8]) -> Vec<u32> {
    let mut offsets = Vec::with_capacity(64);
    offsets.push(0u32);
    for nl in memchr_iter(b'\n', content) {
        if nl + 1 < content.len() {
            offsets.push((nl + 1) as u32);
        }
    }
    offsets.push(content.len() as u32);
    offsets
}

// ---------------------------------------------------------------------------
// Line provider seam
// ---------------------------------------------------------------------------

/// Minimal line access used by context extraction and result shaping.
pub trait LineProvider {
    fn line_count(&self) -> usize;

    /// 1-based line as a borrowed byte slice, without its trailing newline.
    fn line(&self, line: usize) -> Option<&[u8]>;

    /// Inclusive 1-based range of lines; clamped callers only.
    fn line_range(&self, start: usize, end: usize) -> Vec<&[u8]> {
        (start..=end).filter_map(|n| self.line(n)).collect()
    }
}

// ---------------------------------------------------------------------------
// Borrowed file view
// ---------------------------------------------------------------------------

/// Zero-copy view over one file's content plus its offset table. Created
/// per query per file and dropped with it.
pub struct FileView<'a> {
    content: &'a [u8],
    offsets: Cow<'a, [u32]>,
}

impl<'a> FileView<'a> {
    /// Wrap content with index-supplied offsets, or scan once when absent.
    pub fn new(content: &'a [u8], offsets: Option<&'a [u32]>) -> Self {
        match offsets {
            Some(table) if table.first() == Some(&0) && table.len() >= 2 => {
                Self { content, offsets: Cow::Borrowed(table) }
            }
            _ => Self { content, offsets: Cow::Owned(build_line_offsets(content)) },
        }
    }

    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// 1-based line containing a byte offset. Offsets past the end map to
    /// the last line.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        let table = &self.offsets[..self.offsets.len() - 1];
        let idx = table.partition_point(|&start| (start as usize) <= offset);
        idx.max(1)
    }

    /// Byte offset where a 1-based line starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 || line > self.line_count() {
            return None;
        }
        Some(self.offsets[line - 1] as usize)
    }

    /// Half-open byte span of a 1-based line, trailing newline excluded.
    pub fn line_span(&self, line: usize) -> Option<(usize, usize)> {
        if line == 0 || line > self.line_count() {
            return None;
        }
        let start = self.offsets[line - 1] as usize;
        let mut end = self.offsets[line] as usize;
        if end > start && self.content.get(end - 1) == Some(&b'\n') {
            end -= 1;
        }
        if end > start && self.content.get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        Some((start, end))
    }

    /// Column (0-based byte offset from line start) of a content offset.
    pub fn column_of_offset(&self, offset: usize) -> usize {
        let line = self.line_of_offset(offset);
        let start = self.offsets[line - 1] as usize;
        offset.saturating_sub(start)
    }

    /// Lossy UTF-8 copy of a 1-based line.
    pub fn line_string(&self, line: usize) -> Option<String> {
        self.line(line).map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

impl LineProvider for FileView<'_> {
    fn line_count(&self) -> usize {
        self.offsets.len() - 1
    }

    fn line(&self, line: usize) -> Option<&[u8]> {
        let (start, end) = self.line_span(line)?;
        Some(&self.content[start..end])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
