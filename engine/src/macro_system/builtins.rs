//! Built-in macros
//!
//! Conversions read their argument's textual form, so `@int("42")` and
//! `@int($count)` behave the same whether the data holds text or numbers.

use super::errors::MacroError;
use super::registry::Macro;
use super::value::{Value, DATE_FORMAT};
use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;

/// Formats tried by `@date` when no format argument is given
pub const DEFAULT_DATE_FORMATS: &[&str] = &[DATE_FORMAT, "%Y-%m-%d %H:%M:%S", "%Y-%m-%d"];

/// Every built-in macro
pub fn all() -> Vec<Arc<dyn Macro>> {
    vec![
        Arc::new(NoescpMacro),
        Arc::new(IntMacro),
        Arc::new(DoubleMacro),
        Arc::new(EqualsMacro),
        Arc::new(StringMacro),
        Arc::new(LongMacro),
        Arc::new(DateMacro),
        Arc::new(LowerMacro),
        Arc::new(UpperMacro),
        Arc::new(BooleanMacro),
        Arc::new(SplitMacro),
        Arc::new(ConcatMacro),
    ]
}

fn text(value: &Value) -> String {
    value.to_display_string()
}

/// `@int(x)`: 32-bit integer
pub struct IntMacro;

impl Macro for IntMacro {
    fn name(&self) -> &str {
        "int"
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        let text = text(&args[0]);
        text.parse::<i32>()
            .map(|i| Value::Int(i64::from(i)))
            .map_err(|_| MacroError::invalid_argument(text, "a 32-bit integer"))
    }
}

/// `@long(x)`: 64-bit integer
pub struct LongMacro;

impl Macro for LongMacro {
    fn name(&self) -> &str {
        "long"
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        let text = text(&args[0]);
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| MacroError::invalid_argument(text, "a 64-bit integer"))
    }
}

/// `@double(x)`: finite floating point number
pub struct DoubleMacro;

impl Macro for DoubleMacro {
    fn name(&self) -> &str {
        "double"
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        let text = text(&args[0]);
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
            _ => Err(MacroError::invalid_argument(text, "a finite number")),
        }
    }
}

/// `@boolean(x)`: `true` or `false`, any case
pub struct BooleanMacro;

impl Macro for BooleanMacro {
    fn name(&self) -> &str {
        "boolean"
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        let text = text(&args[0]);
        if text.eq_ignore_ascii_case("true") {
            Ok(Value::Bool(true))
        } else if text.eq_ignore_ascii_case("false") {
            Ok(Value::Bool(false))
        } else {
            Err(MacroError::invalid_argument(text, "a boolean"))
        }
    }
}

/// `@date(text)` or `@date(text, format)` with a strftime-style format
pub struct DateMacro;

impl Macro for DateMacro {
    fn name(&self) -> &str {
        "date"
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        let text = text(&args[0]);

        let Some(format) = args.get(1).map(Value::to_display_string) else {
            return DEFAULT_DATE_FORMATS
                .iter()
                .find_map(|format| parse_date(&text, format))
                .map(Value::Date)
                .ok_or_else(|| MacroError::invalid_argument(text, "a date"));
        };

        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(MacroError::custom(format!(
                "'{}' is not a valid date format",
                format
            )));
        }

        parse_date(&text, &format).map(Value::Date).ok_or_else(|| {
            MacroError::invalid_argument(text, format!("a date in the format '{}'", format))
        })
    }
}

/// Date-only formats parse to midnight
fn parse_date(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format).ok().or_else(|| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    })
}

/// `@string(x)`: textual form as a quoted string
pub struct StringMacro;

impl Macro for StringMacro {
    fn name(&self) -> &str {
        "string"
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        Ok(Value::String(text(&args[0])))
    }
}

pub struct LowerMacro;

impl Macro for LowerMacro {
    fn name(&self) -> &str {
        "lower"
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        Ok(Value::String(text(&args[0]).to_lowercase()))
    }
}

pub struct UpperMacro;

impl Macro for UpperMacro {
    fn name(&self) -> &str {
        "upper"
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        Ok(Value::String(text(&args[0]).to_uppercase()))
    }
}

/// `@noescp(x)`: textual form written without quotes
pub struct NoescpMacro;

impl Macro for NoescpMacro {
    fn name(&self) -> &str {
        "noescp"
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        Ok(Value::Verbatim(text(&args[0])))
    }
}

/// `@split(text, delimiter)`
pub struct SplitMacro;

impl Macro for SplitMacro {
    fn name(&self) -> &str {
        "split"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        let text = text(&args[0]);
        let delimiter = args[1].to_display_string();

        let parts = if delimiter.is_empty() {
            text.chars().map(|c| Value::String(c.to_string())).collect()
        } else {
            text.split(delimiter.as_str())
                .map(|part| Value::String(part.to_string()))
                .collect()
        };
        Ok(Value::Array(parts))
    }
}

/// `@concat(a, b, ...)`
pub struct ConcatMacro;

impl Macro for ConcatMacro {
    fn name(&self) -> &str {
        "concat"
    }

    fn max_args(&self) -> Option<usize> {
        None
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        Ok(Value::String(args.iter().map(text).collect()))
    }
}

/// `@equals(a, b)`
pub struct EqualsMacro;

impl Macro for EqualsMacro {
    fn name(&self) -> &str {
        "equals"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn apply(&self, args: &[Value]) -> Result<Value, MacroError> {
        Ok(Value::Bool(args[0] == args[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    #[test]
    fn test_int() {
        assert_eq!(IntMacro.apply(&[s("42")]), Ok(Value::Int(42)));
        assert_eq!(IntMacro.apply(&[Value::Int(-7)]), Ok(Value::Int(-7)));
        assert!(IntMacro.apply(&[s("4000000000")]).is_err());
        assert!(IntMacro.apply(&[s(" 42")]).is_err());
        assert!(IntMacro.apply(&[s("4.2")]).is_err());
    }

    #[test]
    fn test_long() {
        assert_eq!(
            LongMacro.apply(&[s("4000000000")]),
            Ok(Value::Int(4_000_000_000))
        );
        assert!(LongMacro.apply(&[s("forty")]).is_err());
    }

    #[test]
    fn test_double() {
        assert_eq!(DoubleMacro.apply(&[s("1.25")]), Ok(Value::Float(1.25)));
        assert_eq!(DoubleMacro.apply(&[Value::Int(3)]), Ok(Value::Float(3.0)));
        assert!(DoubleMacro.apply(&[s("NaN")]).is_err());
        assert!(DoubleMacro.apply(&[s("inf")]).is_err());
        assert!(DoubleMacro.apply(&[s("x")]).is_err());
    }

    #[test]
    fn test_boolean() {
        assert_eq!(BooleanMacro.apply(&[s("TRUE")]), Ok(Value::Bool(true)));
        assert_eq!(BooleanMacro.apply(&[s("False")]), Ok(Value::Bool(false)));
        assert_eq!(BooleanMacro.apply(&[Value::Bool(true)]), Ok(Value::Bool(true)));
        let err = BooleanMacro.apply(&[s("yes")]).unwrap_err();
        assert_eq!(err, MacroError::invalid_argument("yes", "a boolean"));
    }

    #[test]
    fn test_date_defaults() {
        let expected = NaiveDate::from_ymd_opt(2016, 12, 31)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(DateMacro.apply(&[s("2016-12-31")]), Ok(Value::Date(expected)));

        let with_time = DateMacro.apply(&[s("2016-12-31 08:15:00")]).unwrap();
        assert_eq!(with_time.to_display_string(), "2016-12-31T08:15:00");
        assert!(DateMacro.apply(&[s("31/12/2016")]).is_err());
    }

    #[test]
    fn test_date_with_format() {
        let date = DateMacro
            .apply(&[s("31/12/2016"), s("%d/%m/%Y")])
            .unwrap();
        assert_eq!(date.to_display_string(), "2016-12-31T00:00:00");

        let err = DateMacro.apply(&[s("2016-12-31"), s("%d/%m/%Y")]).unwrap_err();
        assert!(err.to_string().contains("%d/%m/%Y"));
    }

    #[test]
    fn test_date_rejects_malformed_format() {
        let err = DateMacro.apply(&[s("31/12/2016"), s("%d/%m/%")]).unwrap_err();
        assert_eq!(
            err,
            MacroError::custom("'%d/%m/%' is not a valid date format")
        );
    }

    #[test]
    fn test_text_macros() {
        assert_eq!(StringMacro.apply(&[Value::Int(5)]), Ok(s("5")));
        assert_eq!(LowerMacro.apply(&[s("MiXeD")]), Ok(s("mixed")));
        assert_eq!(UpperMacro.apply(&[s("MiXeD")]), Ok(s("MIXED")));
        assert_eq!(
            NoescpMacro.apply(&[s("a \"b\"")]),
            Ok(Value::Verbatim("a \"b\"".into()))
        );
    }

    #[test]
    fn test_split() {
        assert_eq!(
            SplitMacro.apply(&[s("a, b,c"), s(",")]),
            Ok(Value::from(vec!["a", " b", "c"]))
        );
        assert_eq!(
            SplitMacro.apply(&[s("a.b"), s(".")]),
            Ok(Value::from(vec!["a", "b"]))
        );
        assert_eq!(
            SplitMacro.apply(&[s("abc"), s("")]),
            Ok(Value::from(vec!["a", "b", "c"]))
        );
    }

    #[test]
    fn test_concat_and_equals() {
        assert_eq!(
            ConcatMacro.apply(&[s("a"), Value::Int(1), Value::Bool(true)]),
            Ok(s("a1true"))
        );
        assert_eq!(EqualsMacro.apply(&[Value::Int(1), Value::Float(1.0)]), Ok(Value::Bool(true)));
        assert_eq!(EqualsMacro.apply(&[s("1"), Value::Int(1)]), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_arities() {
        assert!(IntMacro.accepts(1) && !IntMacro.accepts(2));
        assert!(DateMacro.accepts(1) && DateMacro.accepts(2) && !DateMacro.accepts(3));
        assert!(SplitMacro.accepts(2) && !SplitMacro.accepts(1));
        assert!(ConcatMacro.accepts(10) && !ConcatMacro.accepts(0));
        assert!(EqualsMacro.accepts(2) && !EqualsMacro.accepts(3));
    }
}
