//! Resolved step options
//!
//! The immutable result of a successful resolution: one typed value per
//! parameter that ended up with a value, plus where each value came from.

use crate::error::MASK;
use crate::validator::Validated;
use pipeconf_core::{ParamValue, ValueSource};
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Final options of one step invocation
#[derive(Clone, PartialEq)]
pub struct ResolvedOptions {
    step: String,
    values: BTreeMap<String, ParamValue>,
    sources: BTreeMap<String, ValueSource>,
    secrets: BTreeSet<String>,
}

impl ResolvedOptions {
    /// Assemble options from values that passed validation
    pub(crate) fn from_validated(step: impl Into<String>, validated: Validated) -> Self {
        let mut options = Self {
            step: step.into(),
            values: BTreeMap::new(),
            sources: BTreeMap::new(),
            secrets: BTreeSet::new(),
        };
        for entry in validated.into_values() {
            if entry.secret {
                options.secrets.insert(entry.name.clone());
            }
            options.sources.insert(entry.name.clone(), entry.source);
            options.values.insert(entry.name, entry.value);
        }
        options
    }

    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ParamValue::as_bool)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_f64)
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(ParamValue::as_list)
    }

    /// Where the value of `name` came from
    pub fn source(&self, name: &str) -> Option<&ValueSource> {
        self.sources.get(name)
    }

    pub fn is_secret(&self, name: &str) -> bool {
        self.secrets.contains(name)
    }

    /// Parameter names with their values, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parameter names with value sources, sorted by name
    pub fn provenance(&self) -> impl Iterator<Item = (&str, &ValueSource)> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// JSON object of all values, keys sorted
    pub fn to_json(&self) -> JsonValue {
        self.render(false)
    }

    /// Same as [`to_json`](Self::to_json) with secret values masked
    pub fn to_redacted_json(&self) -> JsonValue {
        self.render(true)
    }

    /// Pretty JSON text; identical inputs always give identical text
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_json())
    }

    /// Deserialize the options into a step's own options struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.to_json())
    }

    fn render(&self, redact: bool) -> JsonValue {
        let mut object = Map::new();
        for (name, value) in &self.values {
            let json = if redact && self.is_secret(name) {
                JsonValue::String(MASK.to_string())
            } else {
                to_json_value(value)
            };
            object.insert(name.clone(), json);
        }
        JsonValue::Object(object)
    }
}

fn to_json_value(value: &ParamValue) -> JsonValue {
    match value {
        ParamValue::Bool(b) => JsonValue::Bool(*b),
        ParamValue::Int(n) => JsonValue::Number((*n).into()),
        ParamValue::Float(n) => Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number),
        ParamValue::String(s) => JsonValue::String(s.clone()),
        ParamValue::List(items) => {
            JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
        }
    }
}

impl fmt::Debug for ResolvedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedOptions")
            .field("step", &self.step)
            .field("values", &self.to_redacted_json())
            .finish()
    }
}
