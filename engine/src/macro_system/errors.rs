use diagnostics::Diagnostics;
use source_map::SourcePosition;
use std::fmt;

/// Failure reported by a macro body
#[derive(Debug, Clone, PartialEq)]
pub enum MacroError {
    /// An argument could not be read as the type the macro needs
    InvalidArgument { value: String, expected: String },

    /// Any other failure, described by the macro
    Custom(String),
}

impl MacroError {
    pub fn invalid_argument(value: impl Into<String>, expected: impl Into<String>) -> Self {
        MacroError::InvalidArgument {
            value: value.into(),
            expected: expected.into(),
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        MacroError::Custom(message.into())
    }
}

impl fmt::Display for MacroError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroError::InvalidArgument { value, expected } => {
                write!(f, "cannot read '{}' as {}", value, expected)
            }
            MacroError::Custom(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for MacroError {}

/// Errors returned by template resolution
#[derive(Debug, Clone)]
pub enum TemplateError {
    /// One or more lexing/parsing problems; evaluation never started
    Syntax {
        diagnostics: Diagnostics,
        /// All diagnostics rendered with source snippets
        rendered: String,
    },

    /// Leading name of a variable path is not bound
    UndefinedVariable {
        name: String,
        position: SourcePosition,
    },

    /// A path segment could not be followed
    UnresolvedPath {
        path: String,
        segment: String,
        reason: String,
        position: SourcePosition,
    },

    /// Macro name not registered
    UndefinedMacro {
        name: String,
        position: SourcePosition,
    },

    /// Wrong number of arguments passed to macro
    ArgumentCountMismatch {
        macro_name: String,
        min: usize,
        max: Option<usize>,
        found: usize,
        position: SourcePosition,
    },

    /// A value of the wrong type in a block header
    TypeError {
        message: String,
        position: SourcePosition,
    },

    /// A macro body rejected its arguments
    MacroFailed {
        macro_name: String,
        source: MacroError,
        position: SourcePosition,
    },

    /// Evaluation nested deeper than the configured limit
    RecursionLimitExceeded {
        depth: usize,
        max_depth: usize,
        position: SourcePosition,
    },
}

impl TemplateError {
    /// Source position of the offending node, or of the first syntax error
    pub fn location(&self) -> Option<SourcePosition> {
        match self {
            TemplateError::Syntax { diagnostics, .. } => {
                diagnostics.iter().next().map(|d| d.span.start)
            }
            TemplateError::UndefinedVariable { position, .. }
            | TemplateError::UnresolvedPath { position, .. }
            | TemplateError::UndefinedMacro { position, .. }
            | TemplateError::ArgumentCountMismatch { position, .. }
            | TemplateError::TypeError { position, .. }
            | TemplateError::MacroFailed { position, .. }
            | TemplateError::RecursionLimitExceeded { position, .. } => Some(*position),
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self, TemplateError::Syntax { .. })
    }

    /// Error code for this error kind.
    ///
    /// Syntax errors carry their own per-diagnostic codes (E00xx); the
    /// evaluation codes are:
    /// - E0701: Undefined macro
    /// - E0702: Argument count mismatch
    /// - E0703: Type error
    /// - E0704: Macro failure
    /// - E0705: Recursion limit exceeded
    /// - E0710: Undefined variable
    /// - E0711: Unresolved path
    pub fn error_code(&self) -> &'static str {
        match self {
            TemplateError::Syntax { .. } => "E0000",
            TemplateError::UndefinedMacro { .. } => "E0701",
            TemplateError::ArgumentCountMismatch { .. } => "E0702",
            TemplateError::TypeError { .. } => "E0703",
            TemplateError::MacroFailed { .. } => "E0704",
            TemplateError::RecursionLimitExceeded { .. } => "E0705",
            TemplateError::UndefinedVariable { .. } => "E0710",
            TemplateError::UnresolvedPath { .. } => "E0711",
        }
    }

    /// Generate a suggestion string for this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            TemplateError::UndefinedVariable { name, .. } => Some(format!(
                "provide '{}' in the data, or bind it with '#let' or '#for' before use",
                name
            )),
            TemplateError::UndefinedMacro { name, .. } => Some(format!(
                "register a macro named '{}' before resolving",
                name
            )),
            TemplateError::ArgumentCountMismatch {
                macro_name,
                min,
                max,
                ..
            } => Some(format!(
                "'@{}' takes {}",
                macro_name,
                describe_arity(*min, *max)
            )),
            TemplateError::RecursionLimitExceeded { .. } => {
                Some("reduce nesting, or raise max_depth in the configuration".to_string())
            }
            _ => None,
        }
    }
}

fn describe_arity(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => format!("exactly {} argument(s)", min),
        Some(max) => format!("{} to {} arguments", min, max),
        None => format!("at least {} argument(s)", min),
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Syntax { rendered, .. } => {
                write!(f, "template syntax error:\n{}", rendered)
            }
            TemplateError::UndefinedVariable { name, position } => {
                write!(f, "undefined variable '{}' at {}", name, position)
            }
            TemplateError::UnresolvedPath {
                path,
                segment,
                reason,
                position,
            } => {
                write!(
                    f,
                    "cannot resolve '{}' in {} at {}: {}",
                    segment, path, position, reason
                )
            }
            TemplateError::UndefinedMacro { name, position } => {
                write!(f, "undefined macro '@{}' at {}", name, position)
            }
            TemplateError::ArgumentCountMismatch {
                macro_name,
                min,
                max,
                found,
                position,
            } => {
                write!(
                    f,
                    "macro '@{}' expects {}, found {} at {}",
                    macro_name,
                    describe_arity(*min, *max),
                    found,
                    position
                )
            }
            TemplateError::TypeError { message, position } => {
                write!(f, "type error at {}: {}", position, message)
            }
            TemplateError::MacroFailed {
                macro_name,
                source,
                position,
            } => {
                write!(f, "macro '@{}' failed at {}: {}", macro_name, position, source)
            }
            TemplateError::RecursionLimitExceeded {
                depth,
                max_depth,
                position,
            } => {
                write!(
                    f,
                    "evaluation exceeded recursion limit at {}: depth {} > max {}",
                    position, depth, max_depth
                )
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::MacroFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_variable() {
        let err = TemplateError::UndefinedVariable {
            name: "missing".to_string(),
            position: SourcePosition::new(2, 5, 12),
        };
        assert_eq!(err.to_string(), "undefined variable 'missing' at 2:5");
        assert_eq!(err.error_code(), "E0710");
        assert_eq!(err.location().map(|p| (p.line, p.column)), Some((2, 5)));
    }

    #[test]
    fn test_arity_messages() {
        let err = TemplateError::ArgumentCountMismatch {
            macro_name: "date".to_string(),
            min: 1,
            max: Some(2),
            found: 3,
            position: SourcePosition::default(),
        };
        assert!(err.to_string().contains("expects 1 to 2 arguments, found 3"));
        assert_eq!(err.suggestion().as_deref(), Some("'@date' takes 1 to 2 arguments"));
        assert_eq!(describe_arity(1, None), "at least 1 argument(s)");
        assert_eq!(describe_arity(2, Some(2)), "exactly 2 argument(s)");
    }

    #[test]
    fn test_macro_failure_has_source() {
        use std::error::Error;

        let err = TemplateError::MacroFailed {
            macro_name: "int".to_string(),
            source: MacroError::invalid_argument("abc", "a 32-bit integer"),
            position: SourcePosition::default(),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("cannot read 'abc' as a 32-bit integer"));
    }
}
