//! Template macro system
//!
//! This module implements evaluation of parsed templates. It covers:
//!
//! - **Values**: the runtime representation of data-context entries, literals
//!   and macro results
//! - **Environment**: the scope stack over the caller's data context
//! - **Registry**: the `Macro` trait and the name-keyed table of macros
//! - **Built-ins**: the twelve macros every parser starts with
//! - **Evaluator**: tree-walking evaluation of a `Program` into output text

pub mod builtins;
pub mod environment;
pub mod errors;
pub mod interpreter;
pub mod registry;
pub mod value;

pub use environment::Environment;
pub use errors::{MacroError, TemplateError};
pub use interpreter::{Evaluator, DEFAULT_MAX_DEPTH, IMPLICIT_KEY_NAME};
pub use registry::{Macro, MacroRegistry};
pub use value::{data_from_json, data_from_json_value, quote, DataContext, Value, DATE_FORMAT};
