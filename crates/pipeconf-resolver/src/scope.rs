//! Scope filtering
//!
//! Flags and the process environment apply to every parameter. The
//! parameters document and the general/stage/step sections of the
//! configuration file only supply parameters that declare the matching scope.

use pipeconf_core::{ConfigLayer, LayerKind, LayerSet, ParameterSpec};

pub struct ScopeFilter;

impl ScopeFilter {
    /// Whether a layer of `kind` may supply a value for `param`
    pub fn admits(param: &ParameterSpec, kind: LayerKind) -> bool {
        kind.required_scope().map_or(true, |scope| param.in_scope(scope))
    }

    /// Layers eligible for `param`, highest precedence first
    pub fn eligible<'l>(param: &ParameterSpec, layers: &'l LayerSet) -> Vec<&'l ConfigLayer> {
        layers
            .iter()
            .filter(|layer| Self::admits(param, layer.kind))
            .collect()
    }

    /// Layer kinds eligible for `param`, highest precedence first
    pub fn eligible_kinds(param: &ParameterSpec) -> Vec<LayerKind> {
        LayerKind::PRECEDENCE
            .into_iter()
            .filter(|kind| Self::admits(param, *kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeconf_core::Scope;

    fn layers() -> LayerSet {
        LayerSet::new()
            .with_layer(ConfigLayer::new(LayerKind::General, "general").with_entry("p", "g"))
            .with_layer(ConfigLayer::new(LayerKind::Flags, "flags"))
            .with_layer(ConfigLayer::new(LayerKind::Steps, "steps").with_entry("p", "s"))
            .with_layer(ConfigLayer::new(LayerKind::Environment, "env"))
    }

    #[test]
    fn test_unscoped_parameter_sees_flags_and_environment_only() {
        let param = ParameterSpec::string("p");
        let kinds: Vec<LayerKind> = ScopeFilter::eligible(&param, &layers())
            .iter()
            .map(|l| l.kind)
            .collect();
        assert_eq!(kinds, vec![LayerKind::Flags, LayerKind::Environment]);
    }

    #[test]
    fn test_scoped_layers_in_precedence_order() {
        let param = ParameterSpec::string("p").with_scopes([Scope::General, Scope::Steps]);
        let kinds: Vec<LayerKind> = ScopeFilter::eligible(&param, &layers())
            .iter()
            .map(|l| l.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                LayerKind::Flags,
                LayerKind::Environment,
                LayerKind::Steps,
                LayerKind::General
            ]
        );
    }

    #[test]
    fn test_eligible_kinds() {
        let param = ParameterSpec::string("p").with_scopes([Scope::Parameters, Scope::Stages]);
        assert_eq!(
            ScopeFilter::eligible_kinds(&param),
            vec![
                LayerKind::Flags,
                LayerKind::Environment,
                LayerKind::Parameters,
                LayerKind::Stages
            ]
        );
    }
}
