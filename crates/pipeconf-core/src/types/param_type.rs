//! Declared parameter types

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parameter type as declared in step metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "[]string")]
    StringList,
}

impl ParamType {
    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::StringList => "[]string",
        }
    }

    /// Whether a command-line flag of this type may be given without a value
    pub fn is_switch(&self) -> bool {
        matches!(self, ParamType::Bool)
    }
}

impl Default for ParamType {
    fn default() -> Self {
        ParamType::String
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ParamType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(ParamType::String),
            "bool" | "boolean" => Ok(ParamType::Bool),
            "int" | "integer" => Ok(ParamType::Int),
            "float" | "number" => Ok(ParamType::Float),
            "[]string" | "list" => Ok(ParamType::StringList),
            _ => Err(CoreError::UnknownType(s.to_string())),
        }
    }
}
