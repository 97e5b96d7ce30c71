//! Public entry point: parse and resolve templates.

use crate::config::TemplateConfig;
use crate::macro_system::{DataContext, Evaluator, Macro, MacroRegistry, TemplateError};
use parking_lot::RwLock;
use parser::{parse_template, ParseResult, Program};

/// Parses templates and resolves them against data contexts.
///
/// Owns one macro registry, seeded with the built-ins. The registry sits
/// behind a lock so macros can be registered through a shared reference;
/// every resolution works on a snapshot taken when it starts.
#[derive(Debug)]
pub struct TemplateParser {
    registry: RwLock<MacroRegistry>,
    config: TemplateConfig,
}

impl TemplateParser {
    /// Create a parser with every built-in macro registered
    pub fn create() -> Self {
        Self::with_config(TemplateConfig::default())
    }

    pub fn with_config(config: TemplateConfig) -> Self {
        Self {
            registry: RwLock::new(MacroRegistry::with_builtins()),
            config,
        }
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Register a macro, replacing any macro with the same name.
    ///
    /// Resolutions already in progress keep the registry they started with.
    pub fn register_macro(&self, m: impl Macro + 'static) {
        self.registry.write().register(m);
    }

    /// Registered macro names, sorted
    pub fn macro_names(&self) -> Vec<String> {
        self.registry.read().names()
    }

    /// Lex and parse `template` without evaluating it
    pub fn check(&self, template: &str) -> Result<Program, TemplateError> {
        self.parse(template).map(|parsed| parsed.program)
    }

    /// Resolve `template` against `data` into the final text
    pub fn resolve(&self, template: &str, data: &DataContext) -> Result<String, TemplateError> {
        let parsed = self.parse(template)?;
        let registry = self.snapshot();

        let mut evaluator = Evaluator::new(&registry, data, parsed.errors.source_file())
            .with_max_depth(self.config.max_depth);
        evaluator.evaluate(&parsed.program)
    }

    /// Resolve one template against many records, parsing it only once.
    ///
    /// A syntax error fails the whole batch; evaluation errors are reported
    /// per record.
    pub fn resolve_batch(
        &self,
        template: &str,
        records: &[DataContext],
    ) -> Result<Vec<Result<String, TemplateError>>, TemplateError> {
        let parsed = self.parse(template)?;
        let registry = self.snapshot();
        let source = parsed.errors.source_file();

        let results = records
            .iter()
            .map(|data| {
                Evaluator::new(&registry, data, source)
                    .with_max_depth(self.config.max_depth)
                    .evaluate(&parsed.program)
            })
            .collect();
        Ok(results)
    }

    fn snapshot(&self) -> MacroRegistry {
        self.registry.read().clone()
    }

    fn parse(&self, template: &str) -> Result<ParseResult, TemplateError> {
        let parsed = parse_template(template, &self.config.parse_options());
        log::debug!(
            "parsed template ({} bytes): {} top-level nodes, {} errors",
            template.len(),
            parsed.program.nodes.len(),
            parsed.errors.error_count()
        );

        if parsed.has_errors() {
            let rendered = parsed.errors.describe();
            return Err(TemplateError::Syntax {
                diagnostics: parsed.errors.into_diagnostics(),
                rendered,
            });
        }
        Ok(parsed)
    }
}

impl Default for TemplateParser {
    fn default() -> Self {
        Self::create()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macro_system::{MacroError, Value};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_parser_is_shareable() {
        assert_send_sync::<TemplateParser>();
    }

    #[test]
    fn test_check_returns_program() {
        let parser = TemplateParser::create();
        let program = parser.check("a $b @c(1)").unwrap();
        assert_eq!(program.nodes.len(), 4);

        let err = parser.check("#if (true) a").unwrap_err();
        assert!(err.is_syntax_error());
    }

    #[test]
    fn test_register_through_shared_reference() {
        struct Twice;

        impl Macro for Twice {
            fn name(&self) -> &str {
                "twice"
            }

            fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
                let text = args[0].to_display_string();
                Ok(Value::Verbatim(format!("{}{}", text, text)))
            }
        }

        let parser = TemplateParser::create();
        let shared = &parser;
        shared.register_macro(Twice);

        let out = parser.resolve("@twice(ab)", &DataContext::new());
        // bare words are not expressions
        assert!(out.unwrap_err().is_syntax_error());

        let out = parser.resolve("@twice('ab')", &DataContext::new()).unwrap();
        assert_eq!(out, "abab");
        assert!(parser.macro_names().contains(&"twice".to_string()));
    }

    #[test]
    fn test_batch_reports_per_record() {
        let parser = TemplateParser::create();
        let mut good = DataContext::new();
        good.insert("n".to_string(), Value::from("5"));
        let mut bad = DataContext::new();
        bad.insert("n".to_string(), Value::from("five"));

        let results = parser
            .resolve_batch("x = @int($n);", &[good, bad])
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_deref().ok(), Some("x = 5;"));
        assert!(matches!(results[1], Err(TemplateError::MacroFailed { .. })));

        assert!(parser.resolve_batch("#end", &[]).is_err());
    }
}
