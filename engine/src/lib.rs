//! Query template engine
//!
//! Resolves templates written in a small directive language against
//! caller-supplied data:
//!
//! ```text
//! #for (person in $people)
//! insert $$x isa person, has name @string($person.name), has age @int($person.age);
//! #end
//! ```
//!
//! [`TemplateParser`] is the entry point. It lexes and parses the template,
//! fails with every syntax error at once if there are any, and otherwise
//! evaluates the tree through the [`macro_system`].

pub mod config;
pub mod logging;
pub mod macro_system;
pub mod template_parser;

pub use config::TemplateConfig;
pub use macro_system::{
    data_from_json, data_from_json_value, DataContext, Macro, MacroError, MacroRegistry,
    TemplateError, Value,
};
pub use template_parser::TemplateParser;
