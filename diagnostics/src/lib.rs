//! Syntax diagnostics for templates
//!
//! Every [`Diagnostic`] is an error with a code, the span of the offending
//! source, and a label drawn under that span. [`ErrorFormatter`] renders a
//! list of them against the template text in one pass.

pub use source_map::{SourceFile, SourcePosition, SourceSpan};

pub mod template;

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: Option<String>,
    pub message: String,
    pub span: SourceSpan,
    /// Shown after the caret underline
    pub label: Option<String>,
    pub help: Option<String>,
    pub note: Option<String>,
}

impl Diagnostic {
    pub fn error(code: &str, message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            code: Some(code.to_string()),
            message: message.into(),
            span,
            label: None,
            help: None,
            note: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Diagnostics in the order they were reported
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

const RED: &str = "\x1b[31m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_WHITE: &str = "\x1b[1;97m";
const CYAN: &str = "\x1b[96m";
const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";

/// Renders diagnostics as text, optionally with ANSI colors
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorFormatter {
    use_colors: bool,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self { use_colors: false }
    }

    pub fn with_colors() -> Self {
        Self { use_colors: true }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Render every diagnostic, separated by blank lines
    pub fn format_diagnostics(&self, diagnostics: &Diagnostics, file: &SourceFile) -> String {
        diagnostics
            .iter()
            .map(|d| self.format_diagnostic(d, file))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// ```text
    /// error[E0010]: unknown directive '#bogus'
    ///   --> <template>:1:8
    ///   |
    /// 1 | insert #bogus x;
    ///   |        ^^^^^^ not a known directive
    /// ```
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic, file: &SourceFile) -> String {
        let span = &diagnostic.span;
        let mut header = String::from("error");
        if let Some(code) = &diagnostic.code {
            header.push_str(&format!("[{}]", code));
        }

        let mut output = format!(
            "{}: {}\n  {} {}:{}\n",
            self.paint(RED, &header),
            self.paint(BOLD_WHITE, &diagnostic.message),
            self.paint(CYAN, "-->"),
            file.name,
            span.start
        );

        if let Some(line) = file.get_line(span.start.line) {
            let number = span.start.line.to_string();
            let gutter = " ".repeat(number.len());
            let bar = self.paint(CYAN, "|");

            let width = if span.is_single_line() {
                span.end.column.saturating_sub(span.start.column)
            } else {
                // underline to the end of the first line
                (line.chars().count() + 1).saturating_sub(span.start.column)
            };
            let carets = self.paint(RED, &"^".repeat(width.max(1)));
            let padding = " ".repeat(span.start.column - 1);

            output.push_str(&format!("{} {}\n", gutter, bar));
            output.push_str(&format!("{} {} {}\n", self.paint(CYAN, &number), bar, line));
            output.push_str(&format!("{} {} {}{}", gutter, bar, padding, carets));
            if let Some(label) = &diagnostic.label {
                output.push(' ');
                output.push_str(&self.paint(BOLD_RED, label));
            }
            output.push('\n');
        }

        if let Some(help) = &diagnostic.help {
            output.push_str(&format!("  {}: {}\n", self.paint(GREEN, "help"), help));
        }
        if let Some(note) = &diagnostic.note {
            output.push_str(&format!("  {}: {}\n", self.paint(BLUE, "note"), note));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unknown_directive(file: &SourceFile) -> Diagnostic {
        Diagnostic::error("E0010", "unknown directive '#bogus'", file.span(7, 13))
            .with_label("not a known directive")
            .with_help("did you mean '#if'?")
    }

    #[test]
    fn test_plain_format_points_at_column() {
        let file = SourceFile::new("<template>", "insert #bogus x;");
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(unknown_directive(&file));

        let rendered = ErrorFormatter::new().format_diagnostics(&diagnostics, &file);
        assert_eq!(
            rendered,
            "error[E0010]: unknown directive '#bogus'\n\
             \x20 --> <template>:1:8\n\
             \x20 |\n\
             1 | insert #bogus x;\n\
             \x20 |        ^^^^^^ not a known directive\n\
             \x20 help: did you mean '#if'?\n"
        );
    }

    #[test]
    fn test_multi_line_span_underlines_rest_of_first_line() {
        let file = SourceFile::new("<template>", "a #if (x\nb");
        let diagnostic = Diagnostic::error("E0003", "unclosed", file.span(2, 10));

        let rendered = ErrorFormatter::new().format_diagnostic(&diagnostic, &file);
        assert!(rendered.contains("1 | a #if (x\n  |   ^^^^^^\n"));
        assert!(!rendered.contains("help"));
    }

    #[test]
    fn test_colors_are_optional() {
        let file = SourceFile::new("<template>", "insert #bogus x;");
        let diagnostic = unknown_directive(&file);

        let plain = ErrorFormatter::new().format_diagnostic(&diagnostic, &file);
        let colored = ErrorFormatter::with_colors().format_diagnostic(&diagnostic, &file);
        assert!(!plain.contains('\x1b'));
        assert!(colored.contains("\x1b[31merror[E0010]\x1b[0m"));
    }
}
