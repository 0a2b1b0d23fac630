//! Alias resolution
//!
//! A parameter may be spelled by its canonical name or by any of its aliases.
//! Within one layer the canonical spelling wins; otherwise the first alias in
//! declared order that carries a non-empty value is used.

use pipeconf_core::{Alias, ConfigLayer, ParameterSpec, RawValue, StepSchema};
use pipeconf_parser::find_similar;

/// A value found in a layer under one of a parameter's spellings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMatch<'a> {
    /// The spelling found in the layer
    pub key: &'a str,
    pub value: &'a RawValue,
    /// Set when the match went through an alias rather than the canonical name
    pub alias: Option<&'a Alias>,
}

impl AliasMatch<'_> {
    pub fn is_deprecated(&self) -> bool {
        self.alias.is_some_and(|a| a.deprecated)
    }
}

/// A layer key that names no parameter of the step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey {
    pub key: String,
    pub suggestion: Option<String>,
}

pub struct AliasResolver;

impl AliasResolver {
    /// Map a raw key to the canonical parameter name
    pub fn canonical<'s>(schema: &'s StepSchema, raw_key: &str) -> Option<&'s str> {
        schema.canonical_name(raw_key)
    }

    /// Find the value the layer holds for `param`, if any
    pub fn lookup<'a>(param: &'a ParameterSpec, layer: &'a ConfigLayer) -> Option<AliasMatch<'a>> {
        if let Some((key, value)) = layer.entries.get_key_value(param.name.as_str()) {
            if !value.is_empty() {
                return Some(AliasMatch {
                    key,
                    value,
                    alias: None,
                });
            }
        }

        param.aliases.iter().find_map(|alias| {
            layer
                .entries
                .get_key_value(alias.name.as_str())
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| AliasMatch {
                    key,
                    value,
                    alias: Some(alias),
                })
        })
    }

    /// Keys in `layer` that are neither a parameter name nor an alias
    pub fn unknown_keys(schema: &StepSchema, layer: &ConfigLayer) -> Vec<UnknownKey> {
        layer
            .entries
            .keys()
            .filter(|key| schema.lookup(key).is_none())
            .map(|key| UnknownKey {
                key: key.clone(),
                suggestion: find_similar(
                    key,
                    schema.parameters().iter().flat_map(|p| p.keys()),
                ),
            })
            .collect()
    }
}
