//! Diagnostic accumulation for one template
//!
//! The lexer and the syntax builder both report into the same collector so a
//! single resolution attempt surfaces every syntax problem at once.

use crate::template_ast::Span;
use diagnostics::{Diagnostic, Diagnostics, ErrorFormatter, SourceFile, SourceSpan};

/// Name under which template sources appear in rendered diagnostics
pub const TEMPLATE_SOURCE_NAME: &str = "<template>";

#[derive(Debug, Clone)]
pub struct ErrorCollector {
    source: SourceFile,
    diagnostics: Diagnostics,
}

impl ErrorCollector {
    pub fn new(source: &str) -> Self {
        Self::with_name(TEMPLATE_SOURCE_NAME, source)
    }

    pub fn with_name(name: &str, source: &str) -> Self {
        Self {
            source: SourceFile::new(name, source),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Order diagnostics by where they occur in the template
    pub fn sort_by_position(&mut self) {
        self.diagnostics
            .diagnostics
            .sort_by_key(|d| d.span.start.byte_offset);
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Render every collected diagnostic into one message
    pub fn format_diagnostics(&self, use_colors: bool) -> String {
        let formatter = if use_colors {
            ErrorFormatter::with_colors()
        } else {
            ErrorFormatter::new()
        };
        formatter.format_diagnostics(&self.diagnostics, &self.source)
    }

    /// Every diagnostic as one plain-text message with its line and column
    pub fn describe(&self) -> String {
        self.format_diagnostics(false)
    }

    pub fn source_file(&self) -> &SourceFile {
        &self.source
    }

    /// Convert a byte span of the template into a line/column span
    pub fn span(&self, span: Span) -> SourceSpan {
        self.source.span(span.start, span.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagnostics::template::TemplateDiagnostics;

    #[test]
    fn test_empty_collector_has_no_errors() {
        let collector = ErrorCollector::new("plain text");
        assert!(!collector.has_errors());
        assert_eq!(collector.describe(), "");
    }

    #[test]
    fn test_format_includes_every_diagnostic() {
        let mut collector = ErrorCollector::new("#foo\n#bar");
        let first = collector.span(Span::new(0, 4));
        let second = collector.span(Span::new(5, 9));
        collector.report(TemplateDiagnostics::unknown_directive(first, "foo"));
        collector.report(TemplateDiagnostics::unknown_directive(second, "bar"));

        assert!(collector.has_errors());
        assert_eq!(collector.error_count(), 2);

        let text = collector.describe();
        assert!(text.contains("<template>:1:1"));
        assert!(text.contains("<template>:2:1"));
        assert!(text.contains("'#foo'"));
        assert!(text.contains("'#bar'"));
    }

    #[test]
    fn test_sort_by_position() {
        let mut collector = ErrorCollector::new("#foo #bar");
        let late = collector.span(Span::new(5, 9));
        let early = collector.span(Span::new(0, 4));
        collector.report(TemplateDiagnostics::unknown_directive(late, "bar"));
        collector.report(TemplateDiagnostics::unknown_directive(early, "foo"));

        collector.sort_by_position();
        let columns: Vec<_> = collector
            .diagnostics()
            .iter()
            .map(|d| d.span.start.column)
            .collect();
        assert_eq!(columns, vec![1, 6]);
    }

    #[test]
    fn test_span_conversion() {
        let collector = ErrorCollector::new("ab\ncd $x");
        let span = collector.span(Span::new(6, 8));
        assert_eq!((span.start.line, span.start.column), (2, 4));
        assert_eq!((span.end.line, span.end.column), (2, 6));
    }
}
