//! Template front end
//!
//! Lexing and syntax building for query templates. Both stages report into a
//! shared [`ErrorCollector`], so [`parse_template`] always returns a
//! [`ParseResult`] carrying the best-effort [`Program`] together with every
//! syntax diagnostic found in the source.

pub mod error_collector;
pub mod lexer;
pub mod template_ast;
pub mod template_parser;

// Re-export diagnostics from the diagnostics crate
pub use diagnostics::template::TemplateDiagnostics;
pub use diagnostics::{
    Diagnostic, Diagnostics, ErrorFormatter, SourceFile, SourcePosition, SourceSpan,
};

pub use error_collector::{ErrorCollector, TEMPLATE_SOURCE_NAME};
pub use lexer::{tokenize, LexerOptions, Token, TokenKind};
pub use template_ast::*;
pub use template_parser::{build_syntax, SyntaxBuilder};

/// Default limit for nested blocks and nested macro calls
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub max_depth: usize,
    pub trim_directive_newlines: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trim_directive_newlines: true,
        }
    }
}

/// Result of parsing one template
#[derive(Debug)]
pub struct ParseResult {
    /// Best-effort syntax tree; only meaningful when there are no errors
    pub program: Program,
    pub errors: ErrorCollector,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        self.errors.has_errors()
    }

    pub fn format_diagnostics(&self, use_colors: bool) -> String {
        self.errors.format_diagnostics(use_colors)
    }
}

/// Lex and parse `source`, collecting every syntax error.
pub fn parse_template(source: &str, options: &ParseOptions) -> ParseResult {
    let mut errors = ErrorCollector::new(source);
    let lexer_options = LexerOptions {
        trim_directive_newlines: options.trim_directive_newlines,
    };

    let tokens = tokenize(source, &lexer_options, &mut errors);
    let program = build_syntax(&tokens, options.max_depth, &mut errors);
    errors.sort_by_position();

    ParseResult { program, errors }
}
