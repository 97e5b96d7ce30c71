//! TOML configuration for template parsers.
//!
//! ```toml
//! max-depth = 128
//! trim-directive-newlines = false
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use crate::macro_system::DEFAULT_MAX_DEPTH;
use parser::ParseOptions;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Maximum nesting of blocks and macro calls, for parsing and evaluation
    pub max_depth: usize,
    /// Drop the line break that directly follows a block directive
    pub trim_directive_newlines: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trim_directive_newlines: true,
        }
    }
}

impl TemplateConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let config: TemplateConfig =
            toml::from_str(content).map_err(|e| format!("invalid template config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("max-depth must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_depth: self.max_depth,
            trim_directive_newlines: self.trim_directive_newlines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TemplateConfig::from_toml_str("").unwrap();
        assert_eq!(config, TemplateConfig::default());
        assert_eq!(config.max_depth, 256);
        assert!(config.trim_directive_newlines);
    }

    #[test]
    fn test_parse_config() {
        let config = TemplateConfig::from_toml_str(
            r#"
max-depth = 16
trim-directive-newlines = false
"#,
        )
        .unwrap();
        assert_eq!(config.max_depth, 16);
        assert!(!config.trim_directive_newlines);

        let options = config.parse_options();
        assert_eq!(options.max_depth, 16);
        assert!(!options.trim_directive_newlines);
    }

    #[test]
    fn test_invalid_config() {
        assert!(TemplateConfig::from_toml_str("max-depth = 0").is_err());
        assert!(TemplateConfig::from_toml_str("max-depth = \"deep\"").is_err());
        assert!(TemplateConfig::from_toml_str("unknown-key = 1").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = TemplateConfig::from_file(Path::new("/nonexistent/qtemplate.toml")).unwrap_err();
        assert!(err.contains("failed to read"));
    }
}
