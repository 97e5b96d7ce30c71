use super::value::{DataContext, Value};
use std::collections::{HashMap, HashSet};

/// Scoped variable environment for template evaluation.
///
/// The caller's data context sits read-only at the bottom. Above it is a
/// stack of owned frames, the first of which (the program frame) lives for
/// the whole evaluation. Variables are looked up from the innermost frame
/// down to the data context.
#[derive(Debug, Clone)]
pub struct Environment<'d> {
    data: &'d DataContext,
    /// Stack of owned scopes (innermost last), never empty
    scopes: Vec<HashMap<String, Value>>,
}

impl<'d> Environment<'d> {
    /// Create an environment over `data` with the program frame pushed
    pub fn new(data: &'d DataContext) -> Self {
        Self {
            data,
            scopes: vec![HashMap::new()],
        }
    }

    /// Push a new scope onto the stack (entering a loop iteration)
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope.
    ///
    /// Returns the popped scope's variables, or None if only the program frame remains.
    pub fn pop_scope(&mut self) -> Option<HashMap<String, Value>> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Look up a variable by name, searching from innermost scope to the data context
    pub fn get(&self, name: &str) -> Option<&Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Some(value);
            }
        }
        self.data.get(name)
    }

    /// Define a variable in the innermost scope, shadowing any outer binding
    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    /// Number of frames above the program frame
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// All variable names currently visible, sorted (for error messages)
    pub fn visible_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut names: Vec<&str> = self
            .scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.keys())
            .chain(self.data.keys())
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect();
        names.sort_unstable();
        names
    }
}
