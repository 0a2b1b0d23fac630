//! Precedence merging
//!
//! Walks the eligible layers from highest to lowest precedence and keeps the
//! first non-empty value, together with the layer and spelling it came from.

use crate::alias::AliasResolver;
use pipeconf_core::{Alias, ConfigLayer, ParameterSpec, RawValue, ValueSource};

/// A value chosen for a parameter before type validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub raw: RawValue,
    pub source: ValueSource,
    /// The alias the value was spelled with, if not the canonical name
    pub via_alias: Option<Alias>,
}

impl Candidate {
    pub fn new(raw: RawValue, source: ValueSource) -> Self {
        Self {
            raw,
            source,
            via_alias: None,
        }
    }
}

pub struct PrecedenceMerger;

impl PrecedenceMerger {
    /// Pick the winning value among `eligible`, which must be ordered
    /// highest precedence first
    pub fn merge(param: &ParameterSpec, eligible: &[&ConfigLayer]) -> Option<Candidate> {
        eligible.iter().find_map(|layer| {
            AliasResolver::lookup(param, layer).map(|found| Candidate {
                raw: found.value.clone(),
                source: ValueSource::Layer {
                    kind: layer.kind,
                    layer: layer.name.clone(),
                    key: found.key.to_string(),
                },
                via_alias: found.alias.cloned(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeconf_core::LayerKind;

    #[test]
    fn test_highest_layer_wins() {
        let param = ParameterSpec::string("installCommand").with_alias("install");
        let flags = ConfigLayer::new(LayerKind::Flags, "flags");
        let stages = ConfigLayer::new(LayerKind::Stages, "config.yml#stages.Acceptance")
            .with_entry("installCommand", "npm ci");
        let general = ConfigLayer::new(LayerKind::General, "config.yml#general")
            .with_entry("install", "npm install");

        let winner = PrecedenceMerger::merge(&param, &[&flags, &stages, &general]).unwrap();
        assert_eq!(winner.raw, RawValue::text("npm ci"));
        assert_eq!(
            winner.source,
            ValueSource::Layer {
                kind: LayerKind::Stages,
                layer: "config.yml#stages.Acceptance".to_string(),
                key: "installCommand".to_string(),
            }
        );
        assert!(winner.via_alias.is_none());
    }

    #[test]
    fn test_alias_in_lower_layer_is_still_found() {
        let param = ParameterSpec::string("installCommand").with_deprecated_alias("install");
        let general =
            ConfigLayer::new(LayerKind::General, "general").with_entry("install", "npm i");

        let winner = PrecedenceMerger::merge(&param, &[&general]).unwrap();
        assert_eq!(winner.via_alias, Some(Alias::deprecated("install")));
    }

    #[test]
    fn test_empty_values_do_not_win() {
        let param = ParameterSpec::string("p");
        let flags = ConfigLayer::new(LayerKind::Flags, "flags").with_entry("p", "");
        let env = ConfigLayer::new(LayerKind::Environment, "env").with_entry("p", "from-env");

        let winner = PrecedenceMerger::merge(&param, &[&flags, &env]).unwrap();
        assert_eq!(winner.raw, RawValue::text("from-env"));
        assert!(PrecedenceMerger::merge(&param, &[&flags]).is_none());
    }
}
