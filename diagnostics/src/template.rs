//! Template-specific diagnostic builders
//!
//! Helper functions for the syntax errors the template lexer and parser report.

use crate::{Diagnostic, SourceSpan};

/// Provides the common template diagnostics
pub struct TemplateDiagnostics;

impl TemplateDiagnostics {
    /// Unexpected token
    pub fn unexpected_token(span: SourceSpan, found: &str, expected: &[&str]) -> Diagnostic {
        Diagnostic::error("E0001", format!("unexpected {}", found), span)
            .with_label(format!("expected {}", join_alternatives(expected)))
    }

    /// Missing closing delimiter, reported at the opening one
    pub fn missing_closing_delimiter(opening_span: SourceSpan, delimiter: char) -> Diagnostic {
        let closing = match delimiter {
            '(' => ')',
            '[' => ']',
            _ => delimiter,
        };

        Diagnostic::error("E0003", format!("missing closing '{}'", closing), opening_span)
            .with_label(format!("'{}' opened here is never closed", delimiter))
    }

    /// Block opener without a matching `#end`
    pub fn unclosed_block(opening_span: SourceSpan, keyword: &str) -> Diagnostic {
        Diagnostic::error("E0003", format!("unclosed '#{}' block", keyword), opening_span)
            .with_label("this block is never closed")
            .with_help(format!("add '#end' after the body of '#{}'", keyword))
    }

    /// `#name` that is not a known directive
    pub fn unknown_directive(span: SourceSpan, name: &str) -> Diagnostic {
        let diagnostic = Diagnostic::error("E0010", format!("unknown directive '#{}'", name), span)
            .with_label("not a known directive")
            .with_note("write '##' for a literal '#'");

        match suggest_directive(name) {
            Some(suggestion) => diagnostic.with_help(format!("did you mean '#{}'?", suggestion)),
            None => diagnostic,
        }
    }

    /// String literal without a closing quote
    pub fn unterminated_string(span: SourceSpan, quote: char) -> Diagnostic {
        Diagnostic::error("E0011", "unterminated string literal", span)
            .with_label(format!("missing closing {}", quote))
    }

    /// Character that cannot start any token inside a directive
    pub fn unexpected_character(span: SourceSpan, found: char) -> Diagnostic {
        Diagnostic::error("E0012", format!("unexpected character '{}'", found), span)
            .with_label("not valid inside a directive")
    }

    /// `@name` not followed by an argument list
    pub fn missing_macro_arguments(span: SourceSpan, name: &str) -> Diagnostic {
        Diagnostic::error(
            "E0013",
            format!("expected '(' after macro name '@{}'", name),
            span,
        )
        .with_label("macro calls need an argument list")
        .with_note("write '@@' for a literal '@'")
    }

    /// Blocks or macro arguments nested beyond the configured limit
    pub fn nesting_too_deep(span: SourceSpan, max_depth: usize) -> Diagnostic {
        Diagnostic::error(
            "E0014",
            format!("nesting exceeds the maximum depth of {}", max_depth),
            span,
        )
        .with_label("nested too deeply")
    }

    /// `#else`, `#elif` or `#end` with no open block
    pub fn orphan_block_keyword(span: SourceSpan, keyword: &str) -> Diagnostic {
        Diagnostic::error(
            "E0015",
            format!("'#{}' without a matching block opener", keyword),
            span,
        )
        .with_label("no open '#if' or '#for' block")
    }
}

fn join_alternatives(expected: &[&str]) -> String {
    match expected {
        [] => "something else".to_string(),
        [only] => only.to_string(),
        [first, second] => format!("{} or {}", first, second),
        [rest @ .., last] => format!("{}, or {}", rest.join(", "), last),
    }
}

/// Suggest corrections for common directive typos
fn suggest_directive(found: &str) -> Option<&'static str> {
    match found {
        "fi" | "iff" => Some("if"),
        "elseif" | "elsif" | "elf" => Some("elif"),
        "els" | "esle" => Some("else"),
        "endif" | "endfor" | "done" | "fin" => Some("end"),
        "foreach" | "each" | "fro" => Some("for"),
        "set" | "var" | "assign" => Some("let"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceFile;

    fn span() -> SourceSpan {
        SourceFile::new("<template>", "insert $x #endif;").span(10, 16)
    }

    #[test]
    fn test_unknown_directive_suggests() {
        let diagnostic = TemplateDiagnostics::unknown_directive(span(), "endif");

        assert_eq!(diagnostic.code.as_deref(), Some("E0010"));
        assert!(diagnostic.message.contains("#endif"));
        assert_eq!(diagnostic.help.as_deref(), Some("did you mean '#end'?"));

        let diagnostic = TemplateDiagnostics::unknown_directive(span(), "zzz");
        assert_eq!(diagnostic.help, None);
        assert!(diagnostic.note.is_some());
    }

    #[test]
    fn test_unexpected_token_lists_alternatives() {
        let diagnostic =
            TemplateDiagnostics::unexpected_token(span(), "','", &["a name", "')'", "'in'"]);
        assert_eq!(
            diagnostic.label.as_deref(),
            Some("expected a name, ')', or 'in'")
        );

        let diagnostic = TemplateDiagnostics::unexpected_token(span(), "end of input", &["')'"]);
        assert_eq!(diagnostic.label.as_deref(), Some("expected ')'"));
    }

    #[test]
    fn test_suggest_directive() {
        assert_eq!(suggest_directive("elseif"), Some("elif"));
        assert_eq!(suggest_directive("foreach"), Some("for"));
        assert_eq!(suggest_directive("unrelated"), None);
    }
}
