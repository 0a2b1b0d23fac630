//! Parameters document parser
//!
//! The orchestrator may hand a step its parameters as one JSON object
//! (`--parameters-json`). It becomes the `Parameters` layer, consulted only
//! for parameters declaring the PARAMETERS scope.

use crate::error::{ParseError, Result};
use pipeconf_core::{ConfigLayer, LayerKind, RawValue};
use serde_json::Value as JsonValue;

/// Parameters document parser
pub struct ParametersParser;

impl ParametersParser {
    /// Parse a JSON object into a `Parameters` layer
    pub fn parse_json(json_str: &str, origin: impl Into<String>) -> Result<ConfigLayer> {
        let json: JsonValue = serde_json::from_str(json_str)?;
        Self::from_json(&json, origin)
    }

    pub fn from_json(json: &JsonValue, origin: impl Into<String>) -> Result<ConfigLayer> {
        let object = json.as_object().ok_or_else(|| ParseError::InvalidValue {
            field: "parameters".to_string(),
            message: "Parameters document must be a JSON object".to_string(),
        })?;

        let mut layer = ConfigLayer::new(LayerKind::Parameters, origin);
        for (key, value) in object {
            if let Some(raw) = Self::to_raw_value(value) {
                layer.insert(key.clone(), raw);
            }
        }
        Ok(layer)
    }

    fn to_raw_value(value: &JsonValue) -> Option<RawValue> {
        match value {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(RawValue::Text(s.clone())),
            JsonValue::Bool(b) => Some(RawValue::Text(b.to_string())),
            JsonValue::Number(n) => Some(RawValue::Text(n.to_string())),
            JsonValue::Array(items) => Some(RawValue::List(
                items
                    .iter()
                    .filter_map(|item| match item {
                        JsonValue::Null => None,
                        JsonValue::String(s) => Some(s.clone()),
                        other => Some(other.to_string()),
                    })
                    .collect(),
            )),
            JsonValue::Object(_) => Some(RawValue::Text(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters_json() {
        let layer = ParametersParser::parse_json(
            r#"{"changeId": "42", "legacyPRHandling": true, "retries": 3,
                "tags": ["a", "b"], "skip": null}"#,
            "parametersJSON",
        )
        .unwrap();

        assert_eq!(layer.kind, LayerKind::Parameters);
        assert_eq!(layer.get("changeId"), Some(&RawValue::text("42")));
        assert_eq!(layer.get("legacyPRHandling"), Some(&RawValue::text("true")));
        assert_eq!(layer.get("retries"), Some(&RawValue::text("3")));
        assert_eq!(layer.get("tags"), Some(&RawValue::list(["a", "b"])));
        assert_eq!(layer.get("skip"), None);
    }

    #[test]
    fn test_rejects_non_object() {
        let err = ParametersParser::parse_json("[1, 2]", "parametersJSON").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = ParametersParser::parse_json("{", "parametersJSON").unwrap_err();
        assert!(matches!(err, ParseError::JsonError(_)));
    }
}
