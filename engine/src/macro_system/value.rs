use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::fmt;

/// Format used for the textual form of dates
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Variables supplied by the caller, in insertion order
pub type DataContext = IndexMap<String, Value>;

/// Values flowing through template evaluation.
///
/// Data-context entries, literals written in directives and macro results all
/// share this representation.
#[derive(Debug, Clone)]
pub enum Value {
    Null,

    Bool(bool),

    Int(i64),

    Float(f64),

    String(String),

    /// Text that is written to the output exactly as is, never quoted
    Verbatim(String),

    /// Produced by the `date` macro
    Date(NaiveDateTime),

    Array(Vec<Value>),

    /// Keyed record, iteration follows insertion order
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Returns the type name of this value for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Verbatim(_) => "Verbatim",
            Value::Date(_) => "Date",
            Value::Array(_) => "Array",
            Value::Object(_) => "Object",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Textual form, used when a variable is written into the output and
    /// whenever a macro reads its argument as text
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) | Value::Verbatim(s) => s.clone(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_display_string()).collect();
                format!("[{}]", parts.join(","))
            }
            Value::Object(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.to_display_string()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    /// Output form of a macro result: strings are quoted and escaped,
    /// verbatim text and scalars are written as they are
    pub fn render(&self) -> String {
        match self {
            Value::String(s) => quote(s),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(Value::render).collect();
                parts.join(", ")
            }
            other => other.to_display_string(),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Wrap `text` in double quotes, escaping backslashes and quotes
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Verbatim(a), Value::Verbatim(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Parse a JSON object into a data context.
///
/// Fails when the text is not JSON or its top level is not an object.
pub fn data_from_json(text: &str) -> Result<DataContext, String> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("invalid JSON data: {}", e))?;
    data_from_json_value(json)
}

/// Convert an already parsed JSON object into a data context
pub fn data_from_json_value(json: serde_json::Value) -> Result<DataContext, String> {
    match Value::from(json) {
        Value::Object(fields) => Ok(fields),
        other => Err(format!(
            "data must be a JSON object, found {}",
            other.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_display_strings() {
        assert_eq!(Value::Null.to_display_string(), "null");
        assert_eq!(Value::Float(3.0).to_display_string(), "3.0");
        assert_eq!(Value::Float(2.5).to_display_string(), "2.5");
        assert_eq!(Value::from(vec!["a", "b"]).to_display_string(), "[a,b]");

        let date = NaiveDate::from_ymd_opt(2017, 4, 1)
            .and_then(|d| d.and_hms_opt(12, 30, 0))
            .unwrap();
        assert_eq!(Value::Date(date).to_display_string(), "2017-04-01T12:30:00");
    }

    #[test]
    fn test_render_quotes_strings() {
        assert_eq!(Value::from("say \"hi\"").render(), r#""say \"hi\"""#);
        assert_eq!(Value::from(r"a\b").render(), r#""a\\b""#);
        assert_eq!(Value::Verbatim("raw \"x\"".into()).render(), "raw \"x\"");
        assert_eq!(Value::Int(42).render(), "42");
        assert_eq!(Value::from(vec!["a", "b"]).render(), r#""a", "b""#);
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::from("2"));
        assert_ne!(Value::from("x"), Value::Verbatim("x".into()));
    }

    #[test]
    fn test_from_json_keeps_order() {
        let data = data_from_json(r#"{"zeta": 1, "alpha": [true, null, 1.5], "mid": {"k": "v"}}"#)
            .unwrap();
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(
            data["alpha"],
            Value::Array(vec![Value::Bool(true), Value::Null, Value::Float(1.5)])
        );
    }

    #[test]
    fn test_data_must_be_object() {
        assert!(data_from_json("[1, 2]").unwrap_err().contains("Array"));
        assert!(data_from_json("{oops").is_err());
    }
}
