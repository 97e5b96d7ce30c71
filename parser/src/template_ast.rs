//! Template syntax tree with span tracking
//!
//! Every node keeps the byte range of the template source it was built from so
//! evaluation errors can point back at the offending directive.

use std::fmt;

/// Source location information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the start (inclusive)
    pub start: usize,
    /// Byte offset of the end (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub nodes: Vec<Node>,
    pub span: Span,
}

/// One element of a template body
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, escapes already processed
    Text { text: String, span: Span },

    /// A variable path or macro call whose value is written to the output
    Expr(Expr),

    /// `#if (cond) ... #elif (cond) ... #else ... #end`
    ///
    /// `branches` holds the `#if` branch followed by every `#elif`, in source order.
    If {
        branches: Vec<IfBranch>,
        else_body: Option<Vec<Node>>,
        span: Span,
    },

    /// `#for (key, item in iterable) ... #end`
    For {
        key: Option<String>,
        item: String,
        iterable: Expr,
        body: Vec<Node>,
        span: Span,
    },

    /// `#let (name = value)`
    Let { name: String, value: Expr, span: Span },
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Text { span, .. } => *span,
            Node::Expr(expr) => expr.span,
            Node::If { span, .. } => *span,
            Node::For { span, .. } => *span,
            Node::Let { span, .. } => *span,
        }
    }
}

/// One guarded body of an `#if` chain
#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    pub condition: Expr,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Path(VariablePath),
    Call(MacroCall),
    Literal(Literal),
}

/// `$root.field[0]...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePath {
    pub root: String,
    pub segments: Vec<PathSegment>,
}

impl VariablePath {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            segments: Vec::new(),
        }
    }
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.root)?;
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, ".{}", name),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// `@name(args...)`
#[derive(Debug, Clone, PartialEq)]
pub struct MacroCall {
    pub name: String,
    pub args: Vec<Expr>,
}

/// Constants written directly in a directive
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}
