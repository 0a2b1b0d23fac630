//! Raw and typed parameter values
//!
//! Every configuration source hands values over as text (`RawValue`). Only the
//! validator turns them into typed `ParamValue`s according to the declared
//! `ParamType`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Textual value supplied by a configuration source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// A single scalar rendered as text
    Text(String),
    /// A sequence of scalars rendered as text
    List(Vec<String>),
}

impl RawValue {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    /// Create a list value
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawValue::List(items.into_iter().map(Into::into).collect())
    }

    /// An empty string or an empty list counts as "no value"
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Text(s) => s.is_empty(),
            RawValue::List(items) => items.is_empty(),
        }
    }

    /// Text form used in reports; lists are comma-joined
    pub fn render(&self) -> String {
        match self {
            RawValue::Text(s) => s.clone(),
            RawValue::List(items) => items.join(","),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => write!(f, "{}", s),
            RawValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(items: Vec<String>) -> Self {
        RawValue::List(items)
    }
}

/// Typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Integers widen to floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(n) => Some(*n),
            ParamValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Type name as used in schema documents
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::String(_) => "string",
            ParamValue::List(_) => "[]string",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Float(n) => write!(f, "{}", n),
            ParamValue::String(s) => write!(f, "{}", s),
            ParamValue::List(items) => write!(f, "{}", items.join(",")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_emptiness() {
        assert!(RawValue::text("").is_empty());
        assert!(RawValue::List(vec![]).is_empty());
        assert!(!RawValue::text(" ").is_empty());
        assert!(!RawValue::list(["a"]).is_empty());
    }

    #[test]
    fn test_raw_value_render() {
        assert_eq!(RawValue::text("npm ci").render(), "npm ci");
        assert_eq!(RawValue::list(["a", "b"]).render(), "a,b");
        assert_eq!(RawValue::list(["a", "b"]).to_string(), "[a, b]");
    }

    #[test]
    fn test_param_value_accessors() {
        assert_eq!(ParamValue::String("x".into()).as_str(), Some("x"));
        assert_eq!(ParamValue::Bool(true).as_bool(), Some(true));
        assert_eq!(ParamValue::Int(3).as_i64(), Some(3));
        assert_eq!(ParamValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ParamValue::Bool(true).as_str(), None);
        assert_eq!(
            ParamValue::List(vec!["a".into()]).as_list(),
            Some(&["a".to_string()][..])
        );
    }

    #[test]
    fn test_param_value_serializes_untagged() {
        let json = serde_json::to_string(&ParamValue::Bool(false)).unwrap();
        assert_eq!(json, "false");
        let json = serde_json::to_string(&ParamValue::String("npm ci".into())).unwrap();
        assert_eq!(json, "\"npm ci\"");
        let json = serde_json::to_string(&ParamValue::List(vec!["a".into()])).unwrap();
        assert_eq!(json, "[\"a\"]");
    }
}
