//! Template lexer
//!
//! Splits template source into literal text and directive tokens. Outside a
//! directive everything is passed through as [`TokenKind::Text`]; `$`, `@` and
//! `#` followed by an identifier start a directive. Parenthesized headers
//! (macro arguments, `#if (...)`, `#for (...)`, `#let (...)`) are lexed as
//! expressions where whitespace is insignificant.
//!
//! The lexer never fails: malformed input is reported to the
//! [`ErrorCollector`] and lexing continues with the next recognizable piece.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, one_of},
    combinator::{opt, recognize},
    multi::many0,
    sequence::pair,
    IResult, Parser,
};

use crate::error_collector::ErrorCollector;
use crate::template_ast::Span;
use diagnostics::template::TemplateDiagnostics;

/// Directive keywords that take a parenthesized header
const HEADER_KEYWORDS: &[&str] = &["if", "elif", "for", "let"];

/// Directive keywords that open, continue or close a block
pub const BLOCK_KEYWORDS: &[&str] = &["if", "elif", "else", "end", "for", "let"];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Literal passthrough text
    Text(String),
    /// `$` starting a variable path
    Dollar,
    Ident(String),
    /// `@name`
    MacroName(String),
    /// `#name`
    Directive(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Assign,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Text(_) => write!(f, "text"),
            TokenKind::Dollar => write!(f, "'$'"),
            TokenKind::Ident(name) => write!(f, "'{}'", name),
            TokenKind::MacroName(name) => write!(f, "macro '@{}'", name),
            TokenKind::Directive(name) => write!(f, "'#{}'", name),
            TokenKind::Str(_) => write!(f, "string literal"),
            TokenKind::Int(i) => write!(f, "'{}'", i),
            TokenKind::Float(x) => write!(f, "'{}'", x),
            TokenKind::Bool(b) => write!(f, "'{}'", b),
            TokenKind::Null => write!(f, "'null'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Assign => write!(f, "'='"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LexerOptions {
    /// Swallow one line break directly after a block directive
    pub trim_directive_newlines: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            trim_directive_newlines: true,
        }
    }
}

type LResult<'a, T> = IResult<&'a str, T>;

fn identifier(input: &str) -> LResult<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn number(input: &str) -> LResult<'_, &str> {
    recognize((
        opt(char('-')),
        digit1,
        opt((char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

/// `[digits]` directly after a path
fn path_index(input: &str) -> LResult<'_, &str> {
    let (input, _) = char('[').parse(input)?;
    let (input, digits) = digit1.parse(input)?;
    let (input, _) = char(']').parse(input)?;
    Ok((input, digits))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_directive_start(c: char) -> bool {
    c == '$' || c == '@' || c == '#'
}

/// Tokenize a template, reporting malformed input to `errors`.
///
/// The returned stream always ends with [`TokenKind::Eof`].
pub fn tokenize(source: &str, options: &LexerOptions, errors: &mut ErrorCollector) -> Vec<Token> {
    let mut lexer = Lexer {
        full: source,
        rest: source,
        tokens: Vec::new(),
        pending_text: String::new(),
        pending_start: 0,
        options,
        errors,
    };
    lexer.run();
    lexer.tokens
}

struct Lexer<'a, 'c> {
    full: &'a str,
    rest: &'a str,
    tokens: Vec<Token>,
    pending_text: String,
    pending_start: usize,
    options: &'c LexerOptions,
    errors: &'c mut ErrorCollector,
}

impl<'a, 'c> Lexer<'a, 'c> {
    fn position(&self) -> usize {
        self.full.len() - self.rest.len()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let end = self.position();
        self.tokens.push(Token::new(kind, Span::new(start, end)));
    }

    fn advance(&mut self, bytes: usize) {
        self.rest = &self.rest[bytes..];
    }

    fn append_text(&mut self, text: &str) {
        if self.pending_text.is_empty() {
            self.pending_start = self.position();
        }
        self.pending_text.push_str(text);
    }

    fn flush_text(&mut self) {
        if !self.pending_text.is_empty() {
            let text = std::mem::take(&mut self.pending_text);
            let span = Span::new(self.pending_start, self.position());
            self.tokens.push(Token::new(TokenKind::Text(text), span));
        }
    }

    fn run(&mut self) {
        while !self.rest.is_empty() {
            let run: LResult<'a, &'a str> = take_till(is_directive_start).parse(self.rest);
            if let Ok((_, text)) = run {
                if !text.is_empty() {
                    self.append_text(text);
                    self.advance(text.len());
                }
            }

            let mut chars = self.rest.chars();
            let Some(sigil) = chars.next() else { break };
            let next = chars.next();

            match (sigil, next) {
                ('$', Some('$')) | ('@', Some('@')) | ('#', Some('#')) => {
                    // the escape's source span covers both characters
                    if self.pending_text.is_empty() {
                        self.pending_start = self.position();
                    }
                    self.pending_text.push(sigil);
                    self.advance(2);
                }
                ('$', Some(c)) if is_ident_start(c) => {
                    self.flush_text();
                    self.lex_path();
                }
                ('@', Some(c)) if is_ident_start(c) => {
                    self.flush_text();
                    self.lex_macro();
                }
                ('#', Some(c)) if c.is_ascii_alphabetic() => {
                    self.flush_text();
                    self.lex_directive();
                }
                _ => {
                    let rest = self.rest;
                    self.append_text(&rest[..sigil.len_utf8()]);
                    self.advance(sigil.len_utf8());
                }
            }
        }

        self.flush_text();
        let end = self.position();
        self.tokens.push(Token::new(TokenKind::Eof, Span::new(end, end)));
    }

    /// `$name` followed by any `.field` / `[index]` segments
    fn lex_path(&mut self) {
        let start = self.position();
        self.advance(1);
        self.push(TokenKind::Dollar, start);
        self.lex_identifier_token();

        loop {
            let mut chars = self.rest.chars();
            match (chars.next(), chars.next()) {
                (Some('.'), Some(c)) if is_ident_start(c) => {
                    let dot = self.position();
                    self.advance(1);
                    self.push(TokenKind::Dot, dot);
                    self.lex_identifier_token();
                }
                (Some('['), _) => {
                    let Ok((rest, digits)) = path_index(self.rest) else {
                        break;
                    };
                    let open = self.position();
                    self.advance(1);
                    self.push(TokenKind::LBracket, open);

                    let digits_start = self.position();
                    self.advance(digits.len());
                    match digits.parse::<i64>() {
                        Ok(index) => self.push(TokenKind::Int(index), digits_start),
                        Err(_) => {
                            let span = self.errors.span(Span::new(digits_start, self.position()));
                            self.errors.report(TemplateDiagnostics::unexpected_token(
                                span,
                                &format!("index '{}'", digits),
                                &["a smaller index"],
                            ));
                            self.push(TokenKind::Int(i64::MAX), digits_start);
                        }
                    }

                    let close = self.position();
                    self.rest = rest;
                    self.push(TokenKind::RBracket, close);
                }
                _ => break,
            }
        }
    }

    fn lex_identifier_token(&mut self) {
        let start = self.position();
        if let Ok((rest, name)) = identifier(self.rest) {
            self.rest = rest;
            self.push(TokenKind::Ident(name.to_string()), start);
        }
    }

    /// `@name`, plus its argument list when one follows
    fn lex_macro(&mut self) {
        let start = self.position();
        let Ok((rest, name)) = identifier(&self.rest[1..]) else {
            return;
        };
        self.rest = rest;
        self.push(TokenKind::MacroName(name.to_string()), start);

        if self.rest.starts_with('(') {
            self.lex_header();
        }
    }

    /// `#keyword`, its header for `if`/`elif`/`for`/`let`, and the trailing line break
    fn lex_directive(&mut self) {
        let start = self.position();
        let word: LResult<'a, &'a str> =
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '_').parse(&self.rest[1..]);
        let Ok((rest, name)) = word else {
            return;
        };
        self.rest = rest;
        self.push(TokenKind::Directive(name.to_string()), start);

        if HEADER_KEYWORDS.contains(&name) {
            let padding = self.rest.len() - self.rest.trim_start_matches([' ', '\t']).len();
            if self.rest[padding..].starts_with('(') {
                self.advance(padding);
                self.lex_header();
            }
        }

        if self.options.trim_directive_newlines && BLOCK_KEYWORDS.contains(&name) {
            if self.rest.starts_with("\r\n") {
                self.advance(2);
            } else if self.rest.starts_with('\n') {
                self.advance(1);
            }
        }
    }

    /// Lex a balanced `( ... )` group in expression mode
    fn lex_header(&mut self) {
        let opener = self.position();
        self.advance(1);
        self.push(TokenKind::LParen, opener);
        let mut depth = 1usize;

        loop {
            let ws: LResult<'a, &'a str> = multispace0(self.rest);
            if let Ok((rest, _)) = ws {
                self.rest = rest;
            }

            let Some(c) = self.rest.chars().next() else {
                let span = self.errors.span(Span::new(opener, opener + 1));
                self.errors
                    .report(TemplateDiagnostics::missing_closing_delimiter(span, '('));
                return;
            };
            let start = self.position();

            match c {
                '(' => {
                    self.advance(1);
                    self.push(TokenKind::LParen, start);
                    depth += 1;
                }
                ')' => {
                    self.advance(1);
                    self.push(TokenKind::RParen, start);
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                ',' | '=' | '.' | '[' | ']' => {
                    self.advance(1);
                    let kind = match c {
                        ',' => TokenKind::Comma,
                        '=' => TokenKind::Assign,
                        '.' => TokenKind::Dot,
                        '[' => TokenKind::LBracket,
                        _ => TokenKind::RBracket,
                    };
                    self.push(kind, start);
                }
                '"' | '\'' => {
                    if !self.lex_string(c) {
                        // the unterminated literal swallowed the rest of the input
                        return;
                    }
                }
                '$' if self.rest[1..].starts_with(is_ident_start) => self.lex_path(),
                '@' if self.rest[1..].starts_with(is_ident_start) => {
                    if let Ok((rest, name)) = identifier(&self.rest[1..]) {
                        self.rest = rest;
                        self.push(TokenKind::MacroName(name.to_string()), start);
                    }
                }
                c if c.is_ascii_digit()
                    || (c == '-' && self.rest[1..].starts_with(|d: char| d.is_ascii_digit())) =>
                {
                    self.lex_number();
                }
                c if is_ident_start(c) => {
                    if let Ok((rest, word)) = identifier(self.rest) {
                        self.rest = rest;
                        let kind = match word {
                            "true" => TokenKind::Bool(true),
                            "false" => TokenKind::Bool(false),
                            "null" => TokenKind::Null,
                            _ => TokenKind::Ident(word.to_string()),
                        };
                        self.push(kind, start);
                    }
                }
                other => {
                    self.advance(other.len_utf8());
                    let span = self.errors.span(Span::new(start, self.position()));
                    self.errors
                        .report(TemplateDiagnostics::unexpected_character(span, other));
                }
            }
        }
    }

    fn lex_number(&mut self) {
        let start = self.position();
        let Ok((rest, literal)) = number(self.rest) else {
            return;
        };
        self.rest = rest;

        let kind = if literal.contains(['.', 'e', 'E']) {
            literal.parse::<f64>().ok().map(TokenKind::Float)
        } else {
            literal.parse::<i64>().ok().map(TokenKind::Int)
        };

        match kind {
            Some(kind) => self.push(kind, start),
            None => {
                let span = self.errors.span(Span::new(start, self.position()));
                self.errors.report(TemplateDiagnostics::unexpected_token(
                    span,
                    &format!("number '{}'", literal),
                    &["a number within the 64-bit range"],
                ));
            }
        }
    }

    /// Returns false when the literal is unterminated
    fn lex_string(&mut self, quote: char) -> bool {
        let start = self.position();
        let mut value = String::new();
        let mut chars = self.rest[1..].char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, escaped @ ('\\' | '"' | '\''))) => value.push(escaped),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                c if c == quote => {
                    self.advance(1 + i + c.len_utf8());
                    self.push(TokenKind::Str(value), start);
                    return true;
                }
                c => value.push(c),
            }
        }

        let span = self.errors.span(Span::new(start, start + 1));
        self.errors
            .report(TemplateDiagnostics::unterminated_string(span, quote));
        self.rest = &self.rest[self.rest.len()..];
        false
    }
}
