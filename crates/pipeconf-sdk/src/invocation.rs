//! Per-invocation inputs
//!
//! Everything that varies between two runs of the same step: command-line
//! flags, the orchestrator's parameters document, the stage and optionally an
//! explicit variable set instead of the process environment.

use pipeconf_core::{ConfigLayer, LayerKind, RawValue};
use pipeconf_resolver::CancellationFlag;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct StepInvocation {
    /// Values given as command-line flags, keyed by parameter name
    pub flags: BTreeMap<String, RawValue>,

    /// Parsed parameters document
    pub parameters: Option<ConfigLayer>,

    /// Pipeline stage the step runs in
    pub stage: Option<String>,

    /// Variables to read instead of the process environment
    pub env_vars: Option<Vec<(String, String)>>,

    pub cancel: CancellationFlag,
}

impl StepInvocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.flags.insert(name.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: ConfigLayer) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// The `Flags` layer
    pub fn flags_layer(&self) -> ConfigLayer {
        ConfigLayer {
            kind: LayerKind::Flags,
            name: "command line".to_string(),
            entries: self.flags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_layer() {
        let invocation = StepInvocation::new()
            .with_flag("installCommand", "npm ci")
            .with_flag("options", vec!["-Da=1".to_string()])
            .with_stage("Acceptance");

        let layer = invocation.flags_layer();
        assert_eq!(layer.kind, LayerKind::Flags);
        assert_eq!(layer.get("installCommand"), Some(&RawValue::text("npm ci")));
        assert_eq!(layer.len(), 2);
        assert_eq!(invocation.stage.as_deref(), Some("Acceptance"));
    }
}
