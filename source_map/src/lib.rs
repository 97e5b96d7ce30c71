//! Line/column mapping for template sources
//!
//! The lexer works in byte offsets; diagnostics and evaluation errors report
//! 1-based lines and character columns. [`SourceFile`] keeps the template text
//! with its line table and does the conversion.

use std::fmt;

/// A point in the template, both as line/column and as byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open range of template text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceSpan {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceSpan {
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }
}

/// A named template text with the byte offset of every line start
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            name: name.into(),
            content,
            line_starts,
        }
    }

    /// Line `number` (1-based) without its terminator
    pub fn get_line(&self, number: usize) -> Option<&str> {
        let start = *self.line_starts.get(number.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(number)
            .copied()
            .unwrap_or(self.content.len());
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }

    /// Position of byte `offset`; columns count characters, not bytes.
    ///
    /// Offsets past the end clamp to the end of the template.
    pub fn offset_to_position(&self, offset: usize) -> SourcePosition {
        let offset = offset.min(self.content.len());
        let line_index = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line_index];

        let column = match self.content.get(line_start..offset) {
            Some(prefix) => prefix.chars().count() + 1,
            // inside a multi-byte character
            None => offset - line_start + 1,
        };
        SourcePosition::new(line_index + 1, column, offset)
    }

    pub fn span(&self, start: usize, end: usize) -> SourceSpan {
        SourceSpan::new(
            self.offset_to_position(start),
            self.offset_to_position(end.max(start)),
        )
    }
}
