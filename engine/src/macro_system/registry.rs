use super::builtins;
use super::errors::MacroError;
use super::value::Value;
use fxhash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A named, arity-checked function callable from templates as `@name(...)`.
///
/// Arity is checked by the evaluator before `apply` runs, so implementations
/// may index into `args` up to `min_args()` without further checks.
pub trait Macro: Send + Sync {
    /// Name used in templates, case-sensitive
    fn name(&self) -> &str;

    fn min_args(&self) -> usize {
        1
    }

    /// `None` for variadic macros
    fn max_args(&self) -> Option<usize> {
        Some(self.min_args())
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError>;

    /// Whether `count` arguments are acceptable
    fn accepts(&self, count: usize) -> bool {
        count >= self.min_args() && self.max_args().map_or(true, |max| count <= max)
    }
}

/// Name-keyed table of available macros
#[derive(Clone, Default)]
pub struct MacroRegistry {
    macros: FxHashMap<String, Arc<dyn Macro>>,
}

impl MacroRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in macro
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for builtin in builtins::all() {
            registry.register_arc(builtin);
        }
        registry
    }

    /// Register a macro under its own name, replacing any existing one.
    ///
    /// Returns the macro previously registered under that name.
    pub fn register(&mut self, m: impl Macro + 'static) -> Option<Arc<dyn Macro>> {
        self.register_arc(Arc::new(m))
    }

    pub fn register_arc(&mut self, m: Arc<dyn Macro>) -> Option<Arc<dyn Macro>> {
        let name = m.name().to_string();
        let previous = self.macros.insert(name.clone(), m);
        if previous.is_some() {
            log::debug!("macro '@{}' replaced by a new registration", name);
        } else {
            log::trace!("registered macro '@{}'", name);
        }
        previous
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Macro>> {
        self.macros.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.macros.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

impl fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("macros", &self.names())
            .finish()
    }
}
