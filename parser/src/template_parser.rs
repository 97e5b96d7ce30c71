//! Syntax builder
//!
//! Turns the token stream into a [`Program`]. Parsing never stops at the first
//! problem: every error goes to the [`ErrorCollector`] and the builder
//! resynchronizes at the end of the offending directive header (or skips the
//! offending block) before continuing.

use crate::error_collector::ErrorCollector;
use crate::lexer::{Token, TokenKind};
use crate::template_ast::*;
use diagnostics::template::TemplateDiagnostics;

static EOF: Token = Token {
    kind: TokenKind::Eof,
    span: Span { start: 0, end: 0 },
};

/// How a body ended. Indices point at the consumed directive token.
enum Terminator {
    Eof,
    Elif(usize),
    Else(usize),
    End(usize),
}

/// Build the syntax tree for `tokens`, reporting problems to `errors`.
pub fn build_syntax(tokens: &[Token], max_depth: usize, errors: &mut ErrorCollector) -> Program {
    SyntaxBuilder::new(tokens, max_depth, errors).build()
}

pub struct SyntaxBuilder<'t, 'c> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
    errors: &'c mut ErrorCollector,
}

impl<'t, 'c> SyntaxBuilder<'t, 'c> {
    pub fn new(tokens: &'t [Token], max_depth: usize, errors: &'c mut ErrorCollector) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
            errors,
        }
    }

    pub fn build(mut self) -> Program {
        let (nodes, _) = self.parse_body(false);
        let end = self.tokens.last().map(|t| t.span.end).unwrap_or(0);
        Program {
            nodes,
            span: Span::new(0, end),
        }
    }

    fn peek(&self) -> &'t Token {
        let tokens: &'t [Token] = self.tokens;
        tokens.get(self.pos).unwrap_or(&EOF)
    }

    fn peek_at(&self, index: usize) -> &'t Token {
        let tokens: &'t [Token] = self.tokens;
        tokens.get(index).unwrap_or(&EOF)
    }

    fn bump(&mut self) -> &'t Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Report the current token as unexpected.
    ///
    /// End of input inside a header is always preceded by a lexer error
    /// (unclosed `(` or unterminated string), so it is not reported twice.
    fn report_unexpected(&mut self, expected: &[&str]) {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            return;
        }
        let span = self.errors.span(token.span);
        self.errors.report(TemplateDiagnostics::unexpected_token(
            span,
            &token.kind.to_string(),
            expected,
        ));
    }

    /// Skip past the `)` matching the `(` at `open`
    fn skip_group(&mut self, open: usize) {
        self.pos = open + 1;
        let mut depth = 1usize;
        loop {
            match self.bump().kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
        }
    }

    fn skip_header(&mut self) {
        if self.peek().kind == TokenKind::LParen {
            let open = self.pos;
            self.skip_group(open);
        }
    }

    /// Skip the rest of a block whose opener was just consumed
    fn skip_block(&mut self) {
        let mut depth = 1usize;
        loop {
            match &self.bump().kind {
                TokenKind::Directive(name) if name == "if" || name == "for" => depth += 1,
                TokenKind::Directive(name) if name == "end" => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
        }
    }

    /// Enter one nesting level for the block opened by `opener`
    fn enter_block(&mut self, opener: &Token) -> bool {
        if self.depth >= self.max_depth {
            let span = self.errors.span(opener.span);
            self.errors
                .report(TemplateDiagnostics::nesting_too_deep(span, self.max_depth));
            self.skip_header();
            self.skip_block();
            return false;
        }
        self.depth += 1;
        true
    }

    fn parse_body(&mut self, in_block: bool) -> (Vec<Node>, Terminator) {
        let mut nodes = Vec::new();

        loop {
            let start = self.pos;
            let token = self.peek();

            match &token.kind {
                TokenKind::Eof => return (nodes, Terminator::Eof),
                TokenKind::Text(text) => {
                    self.bump();
                    nodes.push(Node::Text {
                        text: text.clone(),
                        span: token.span,
                    });
                }
                TokenKind::Dollar => {
                    if let Some(expr) = self.parse_path() {
                        nodes.push(Node::Expr(expr));
                    }
                }
                TokenKind::MacroName(_) => match self.parse_macro_call() {
                    Some(expr) => nodes.push(Node::Expr(expr)),
                    None => self.recover(start),
                },
                TokenKind::Directive(name) => match name.as_str() {
                    "if" => {
                        if let Some(node) = self.parse_if() {
                            nodes.push(node);
                        }
                    }
                    "for" => {
                        if let Some(node) = self.parse_for() {
                            nodes.push(node);
                        }
                    }
                    "let" => {
                        if let Some(node) = self.parse_let() {
                            nodes.push(node);
                        }
                    }
                    "elif" | "else" | "end" => {
                        self.bump();
                        if in_block {
                            let terminator = match name.as_str() {
                                "elif" => Terminator::Elif(start),
                                "else" => Terminator::Else(start),
                                _ => Terminator::End(start),
                            };
                            return (nodes, terminator);
                        }
                        let span = self.errors.span(token.span);
                        self.errors
                            .report(TemplateDiagnostics::orphan_block_keyword(span, name));
                        self.skip_header();
                    }
                    _ => {
                        self.bump();
                        let span = self.errors.span(token.span);
                        self.errors
                            .report(TemplateDiagnostics::unknown_directive(span, name));
                    }
                },
                _ => {
                    self.report_unexpected(&["text or a directive"]);
                    self.bump();
                }
            }
        }
    }

    /// Resynchronize after a failed macro call that started at `start`
    fn recover(&mut self, start: usize) {
        if self.peek_at(start + 1).kind == TokenKind::LParen {
            self.skip_group(start + 1);
        }
    }

    /// `( ... )` after a directive; `parse` handles the inside
    fn parse_header<T>(
        &mut self,
        directive: &Token,
        parse: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<T> {
        if self.peek().kind != TokenKind::LParen {
            let span = self.errors.span(directive.span);
            self.errors.report(TemplateDiagnostics::unexpected_token(
                span,
                &format!("{} without a header", directive.kind),
                &["'(' after the directive"],
            ));
            return None;
        }

        let open = self.pos;
        self.bump();

        match parse(self) {
            Some(value) if self.peek().kind == TokenKind::RParen => {
                self.bump();
                Some(value)
            }
            Some(_) => {
                self.report_unexpected(&["')'"]);
                self.skip_group(open);
                None
            }
            None => {
                self.skip_group(open);
                None
            }
        }
    }

    /// Body of a block that may only be closed by `#end`.
    ///
    /// Returns the nodes and the end offset of the closing `#end`.
    fn parse_closing_body(&mut self, opener: &Token, keyword: &str) -> Option<(Vec<Node>, usize)> {
        let mut nodes = Vec::new();

        loop {
            let (body, terminator) = self.parse_body(true);
            nodes.extend(body);

            match terminator {
                Terminator::End(index) => return Some((nodes, self.peek_at(index).span.end)),
                Terminator::Eof => {
                    let span = self.errors.span(opener.span);
                    self.errors
                        .report(TemplateDiagnostics::unclosed_block(span, keyword));
                    return None;
                }
                Terminator::Elif(index) | Terminator::Else(index) => {
                    let stray = self.peek_at(index);
                    let span = self.errors.span(stray.span);
                    self.errors.report(TemplateDiagnostics::unexpected_token(
                        span,
                        &stray.kind.to_string(),
                        &["'#end'"],
                    ));
                    self.skip_header();
                }
            }
        }
    }

    fn parse_if(&mut self) -> Option<Node> {
        let opener = self.bump();
        if !self.enter_block(opener) {
            return None;
        }
        let node = self.parse_if_chain(opener);
        self.depth -= 1;
        node
    }

    fn parse_if_chain(&mut self, opener: &'t Token) -> Option<Node> {
        let mut branches = Vec::new();
        let mut malformed = false;
        let mut directive = opener;
        let mut else_body = None;

        let end = loop {
            let condition = self.parse_header(directive, |p| p.parse_expr());
            if condition.is_none() && self.at_eof() {
                return None;
            }

            let (body, terminator) = self.parse_body(true);
            match condition {
                Some(condition) => branches.push(IfBranch { condition, body }),
                None => malformed = true,
            }

            match terminator {
                Terminator::Elif(index) => directive = self.peek_at(index),
                Terminator::Else(_) => {
                    let (body, end) = self.parse_closing_body(opener, "if")?;
                    else_body = Some(body);
                    break end;
                }
                Terminator::End(index) => break self.peek_at(index).span.end,
                Terminator::Eof => {
                    let span = self.errors.span(opener.span);
                    self.errors
                        .report(TemplateDiagnostics::unclosed_block(span, "if"));
                    return None;
                }
            }
        };

        if malformed {
            return None;
        }
        Some(Node::If {
            branches,
            else_body,
            span: Span::new(opener.span.start, end),
        })
    }

    fn parse_for(&mut self) -> Option<Node> {
        let opener = self.bump();
        if !self.enter_block(opener) {
            return None;
        }

        let header = self.parse_header(opener, |p| p.parse_for_header());
        if header.is_none() && self.at_eof() {
            self.depth -= 1;
            return None;
        }
        let body = self.parse_closing_body(opener, "for");
        self.depth -= 1;

        let (key, item, iterable) = header?;
        let (body, end) = body?;
        Some(Node::For {
            key,
            item,
            iterable,
            body,
            span: Span::new(opener.span.start, end),
        })
    }

    fn parse_for_header(&mut self) -> Option<(Option<String>, String, Expr)> {
        let first = self.expect_name(&["a loop variable name"])?;
        let (key, item) = if self.peek().kind == TokenKind::Comma {
            self.bump();
            let second = self.expect_name(&["a loop variable name"])?;
            (Some(first), second)
        } else {
            (None, first)
        };

        match &self.peek().kind {
            TokenKind::Ident(word) if word == "in" => {
                self.bump();
            }
            _ => {
                let expected: &[&str] = if key.is_none() {
                    &["','", "'in'"]
                } else {
                    &["'in'"]
                };
                self.report_unexpected(expected);
                return None;
            }
        }

        let iterable = self.parse_expr()?;
        Some((key, item, iterable))
    }

    fn parse_let(&mut self) -> Option<Node> {
        let opener = self.bump();
        let (name, value) = self.parse_header(opener, |p| {
            let name = p.expect_name(&["a variable name"])?;
            if p.peek().kind != TokenKind::Assign {
                p.report_unexpected(&["'='"]);
                return None;
            }
            p.bump();
            let value = p.parse_expr()?;
            Some((name, value))
        })?;

        let end = self.peek_at(self.pos.saturating_sub(1)).span.end;
        Some(Node::Let {
            name,
            value,
            span: Span::new(opener.span.start, end),
        })
    }

    fn expect_name(&mut self, expected: &[&str]) -> Option<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) if name != "in" => {
                let name = name.clone();
                self.bump();
                Some(name)
            }
            _ => {
                self.report_unexpected(expected);
                None
            }
        }
    }

    fn parse_expr(&mut self) -> Option<Expr> {
        let token = self.peek();
        let literal = match &token.kind {
            TokenKind::Dollar => return self.parse_path(),
            TokenKind::MacroName(_) => return self.parse_macro_call(),
            TokenKind::Str(s) => Literal::Str(s.clone()),
            TokenKind::Int(i) => Literal::Int(*i),
            TokenKind::Float(x) => Literal::Float(*x),
            TokenKind::Bool(b) => Literal::Bool(*b),
            TokenKind::Null => Literal::Null,
            _ => {
                self.report_unexpected(&["a variable", "a macro call", "a literal"]);
                return None;
            }
        };

        self.bump();
        Some(Expr {
            kind: ExprKind::Literal(literal),
            span: token.span,
        })
    }

    /// `$root` plus the segments written directly after it
    fn parse_path(&mut self) -> Option<Expr> {
        let dollar = self.bump();
        let root = match &self.peek().kind {
            TokenKind::Ident(name) => {
                self.bump();
                name.clone()
            }
            _ => {
                self.report_unexpected(&["a variable name"]);
                return None;
            }
        };

        let mut path = VariablePath::new(root);
        let mut end = self.peek_at(self.pos - 1).span.end;

        loop {
            let next = self.peek();
            if next.span.start != end {
                break;
            }

            match (&next.kind, &self.peek_at(self.pos + 1).kind) {
                (TokenKind::Dot, TokenKind::Ident(field)) => {
                    path.segments.push(PathSegment::Field(field.clone()));
                    self.pos += 2;
                }
                (TokenKind::LBracket, TokenKind::Int(index))
                    if self.peek_at(self.pos + 2).kind == TokenKind::RBracket =>
                {
                    let Ok(index) = usize::try_from(*index) else {
                        break;
                    };
                    path.segments.push(PathSegment::Index(index));
                    self.pos += 3;
                }
                _ => break,
            }
            end = self.peek_at(self.pos - 1).span.end;
        }

        Some(Expr {
            kind: ExprKind::Path(path),
            span: Span::new(dollar.span.start, end),
        })
    }

    fn parse_macro_call(&mut self) -> Option<Expr> {
        let name_token = self.bump();
        let TokenKind::MacroName(name) = &name_token.kind else {
            return None;
        };

        if self.peek().kind != TokenKind::LParen {
            let span = self.errors.span(name_token.span);
            self.errors
                .report(TemplateDiagnostics::missing_macro_arguments(span, name));
            return None;
        }

        if self.depth >= self.max_depth {
            let span = self.errors.span(name_token.span);
            self.errors
                .report(TemplateDiagnostics::nesting_too_deep(span, self.max_depth));
            self.skip_header();
            return None;
        }

        self.depth += 1;
        self.bump();
        let args = self.parse_arguments();
        self.depth -= 1;

        let (args, end) = args?;
        Some(Expr {
            kind: ExprKind::Call(MacroCall {
                name: name.clone(),
                args,
            }),
            span: Span::new(name_token.span.start, end),
        })
    }

    /// Arguments after the opening `(`, through the closing `)`
    fn parse_arguments(&mut self) -> Option<(Vec<Expr>, usize)> {
        let mut args = Vec::new();

        if self.peek().kind == TokenKind::RParen {
            return Some((args, self.bump().span.end));
        }

        loop {
            args.push(self.parse_expr()?);
            match self.peek().kind {
                TokenKind::Comma => {
                    self.bump();
                }
                TokenKind::RParen => return Some((args, self.bump().span.end)),
                _ => {
                    self.report_unexpected(&["','", "')'"]);
                    return None;
                }
            }
        }
    }
}
