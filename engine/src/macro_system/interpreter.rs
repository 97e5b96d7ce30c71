//! Tree-walking evaluator for parsed templates.
//!
//! Walks the nodes of a [`Program`] in order, appending literal text and
//! rendered values to the output. The evaluator handles:
//! - Variable paths resolved through the scope stack
//! - Macro calls (arguments first, then lookup, arity check and apply)
//! - `#if` / `#elif` / `#else` with strictly boolean conditions
//! - `#for` over arrays and objects, one scope frame per iteration
//! - `#let` bindings in the innermost frame
//!
//! Evaluation stops at the first error; partial output is discarded.

use super::environment::Environment;
use super::errors::TemplateError;
use super::registry::MacroRegistry;
use super::value::{DataContext, Value};
use parser::{
    Expr, ExprKind, IfBranch, Literal, MacroCall, Node, PathSegment, Program, Span, VariablePath,
};
use smallvec::SmallVec;
use source_map::{SourceFile, SourcePosition};

/// Maximum nesting of blocks and macro calls during evaluation
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Name bound to the key when iterating an object without an explicit key name
pub const IMPLICIT_KEY_NAME: &str = "key";

/// Arguments of one macro call; most calls take one or two
type MacroArgs = SmallVec<[Value; 4]>;

/// Evaluates one program against one data context.
pub struct Evaluator<'a> {
    /// Variable environment with the data context at the bottom
    env: Environment<'a>,
    registry: &'a MacroRegistry,
    /// Template source, for turning spans into positions
    source: &'a SourceFile,
    /// Current nesting depth (blocks and macro calls)
    depth: usize,
    max_depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a MacroRegistry, data: &'a DataContext, source: &'a SourceFile) -> Self {
        Self {
            env: Environment::new(data),
            registry,
            source,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Render `program` into a string
    pub fn evaluate(&mut self, program: &Program) -> Result<String, TemplateError> {
        let mut output = String::new();
        self.eval_body(&program.nodes, &mut output)?;
        log::trace!(
            "evaluated {} top-level nodes into {} bytes",
            program.nodes.len(),
            output.len()
        );
        Ok(output)
    }

    fn position(&self, span: Span) -> SourcePosition {
        self.source.offset_to_position(span.start)
    }

    fn enter(&mut self, span: Span) -> Result<(), TemplateError> {
        if self.depth >= self.max_depth {
            return Err(TemplateError::RecursionLimitExceeded {
                depth: self.depth + 1,
                max_depth: self.max_depth,
                position: self.position(span),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn eval_body(&mut self, nodes: &[Node], output: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            self.eval_node(node, output)?;
        }
        Ok(())
    }

    fn eval_node(&mut self, node: &Node, output: &mut String) -> Result<(), TemplateError> {
        match node {
            Node::Text { text, .. } => output.push_str(text),

            Node::Expr(expr) => {
                let value = self.eval_expr(expr)?;
                match expr.kind {
                    ExprKind::Call(_) => output.push_str(&value.render()),
                    _ => output.push_str(&value.to_display_string()),
                }
            }

            Node::If {
                branches,
                else_body,
                span,
            } => {
                self.enter(*span)?;
                let result = self.eval_if(branches, else_body.as_deref(), output);
                self.leave();
                result?;
            }

            Node::For {
                key,
                item,
                iterable,
                body,
                span,
            } => {
                self.enter(*span)?;
                let result = self.eval_for(key.as_deref(), item, iterable, body, output);
                self.leave();
                result?;
            }

            Node::Let { name, value, .. } => {
                let value = self.eval_expr(value)?;
                self.env.define(name, value);
            }
        }
        Ok(())
    }

    /// Run the first branch whose condition is true, else the `#else` body
    fn eval_if(
        &mut self,
        branches: &[IfBranch],
        else_body: Option<&[Node]>,
        output: &mut String,
    ) -> Result<(), TemplateError> {
        for branch in branches {
            if self.eval_condition(&branch.condition)? {
                return self.eval_body(&branch.body, output);
            }
        }

        match else_body {
            Some(else_body) => self.eval_body(else_body, output),
            None => Ok(()),
        }
    }

    fn eval_condition(&mut self, condition: &Expr) -> Result<bool, TemplateError> {
        match self.eval_expr(condition)? {
            Value::Bool(selected) => Ok(selected),
            other => Err(TemplateError::TypeError {
                message: format!("condition must be a Bool, found {}", other.type_name()),
                position: self.position(condition.span),
            }),
        }
    }

    fn eval_for(
        &mut self,
        key: Option<&str>,
        item: &str,
        iterable: &Expr,
        body: &[Node],
        output: &mut String,
    ) -> Result<(), TemplateError> {
        let (entries, is_object): (Vec<(Value, Value)>, bool) = match self.eval_expr(iterable)? {
            Value::Array(items) => (
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| (Value::Int(index as i64), value))
                    .collect(),
                false,
            ),
            Value::Object(fields) => (
                fields
                    .into_iter()
                    .map(|(name, value)| (Value::String(name), value))
                    .collect(),
                true,
            ),
            other => {
                return Err(TemplateError::TypeError {
                    message: format!("cannot iterate over {}", other.type_name()),
                    position: self.position(iterable.span),
                })
            }
        };

        log::trace!("iterating {} entries as '{}'", entries.len(), item);

        for (entry_key, value) in entries {
            self.env.push_scope();
            match key {
                Some(key) => self.env.define(key, entry_key),
                None if is_object => self.env.define(IMPLICIT_KEY_NAME, entry_key),
                None => {}
            }
            self.env.define(item, value);

            let result = self.eval_body(body, output);
            self.env.pop_scope();
            result?;
        }
        Ok(())
    }

    /// Evaluate an expression to a value
    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, TemplateError> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                Literal::Str(s) => Value::String(s.clone()),
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(f) => Value::Float(*f),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            }),
            ExprKind::Path(path) => self.resolve_path(path, expr.span).cloned(),
            ExprKind::Call(call) => {
                self.enter(expr.span)?;
                let result = self.eval_call(call, expr.span);
                self.leave();
                result
            }
        }
    }

    fn eval_call(&mut self, call: &MacroCall, span: Span) -> Result<Value, TemplateError> {
        let args = call
            .args
            .iter()
            .map(|arg| self.eval_expr(arg))
            .collect::<Result<MacroArgs, _>>()?;

        let Some(m) = self.registry.lookup(&call.name) else {
            return Err(TemplateError::UndefinedMacro {
                name: call.name.clone(),
                position: self.position(span),
            });
        };

        if !m.accepts(args.len()) {
            return Err(TemplateError::ArgumentCountMismatch {
                macro_name: call.name.clone(),
                min: m.min_args(),
                max: m.max_args(),
                found: args.len(),
                position: self.position(span),
            });
        }

        m.apply(&args).map_err(|source| TemplateError::MacroFailed {
            macro_name: call.name.clone(),
            source,
            position: self.position(span),
        })
    }

    /// Follow `path` through the scope stack and into nested values
    fn resolve_path(&self, path: &VariablePath, span: Span) -> Result<&Value, TemplateError> {
        let Some(mut current) = self.env.get(&path.root) else {
            log::debug!(
                "undefined variable '{}', visible: {:?}",
                path.root,
                self.env.visible_names()
            );
            return Err(TemplateError::UndefinedVariable {
                name: path.root.clone(),
                position: self.position(span),
            });
        };

        for segment in &path.segments {
            current = match (segment, current) {
                (PathSegment::Field(name), Value::Object(fields)) => match fields.get(name) {
                    Some(value) => value,
                    None => return Err(self.unresolved(path, segment, "no such field", span)),
                },
                (PathSegment::Index(index), Value::Array(items)) => match items.get(*index) {
                    Some(value) => value,
                    None => {
                        let reason = format!("index out of range for length {}", items.len());
                        return Err(self.unresolved(path, segment, &reason, span));
                    }
                },
                (PathSegment::Field(_), other) => {
                    let reason = format!("{} has no fields", other.type_name());
                    return Err(self.unresolved(path, segment, &reason, span));
                }
                (PathSegment::Index(_), other) => {
                    let reason = format!("{} cannot be indexed", other.type_name());
                    return Err(self.unresolved(path, segment, &reason, span));
                }
            };
        }

        Ok(current)
    }

    fn unresolved(
        &self,
        path: &VariablePath,
        segment: &PathSegment,
        reason: &str,
        span: Span,
    ) -> TemplateError {
        TemplateError::UnresolvedPath {
            path: path.to_string(),
            segment: segment.to_string(),
            reason: reason.to_string(),
            position: self.position(span),
        }
    }
}
