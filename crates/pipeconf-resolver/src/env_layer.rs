//! Environment variable layer
//!
//! Builds the `Environment` layer from prefixed process variables, e.g.
//! `PIPER_installCommand=npm ci`. Only canonical parameter names of the step
//! are picked up.

use pipeconf_core::{ConfigLayer, LayerKind, RawValue, StepSchema};
use tracing::debug;

pub const DEFAULT_ENV_PREFIX: &str = "PIPER_";

#[derive(Debug, Clone)]
pub struct EnvironmentLayerLoader {
    prefix: String,
}

impl Default for EnvironmentLayerLoader {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_PREFIX)
    }
}

impl EnvironmentLayerLoader {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Variable consulted for `parameter`
    pub fn variable_name(&self, parameter: &str) -> String {
        format!("{}{}", self.prefix, parameter)
    }

    /// Build the layer from the process environment
    pub fn load(&self, schema: &StepSchema) -> ConfigLayer {
        // Variables that are not valid unicode cannot name a parameter
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        self.load_from(schema, vars)
    }

    /// Build the layer from an explicit variable list
    pub fn load_from<I, K, V>(&self, schema: &StepSchema, vars: I) -> ConfigLayer
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut layer =
            ConfigLayer::new(LayerKind::Environment, format!("environment ({}*)", self.prefix));

        for (key, value) in vars {
            let key = key.as_ref();
            let Some(name) = key.strip_prefix(self.prefix.as_str()) else {
                continue;
            };
            if schema.parameter(name).is_some() {
                debug!(step = %schema.name(), variable = %key, "Picked up environment variable");
                layer.insert(name, RawValue::Text(value.into()));
            }
        }

        layer
    }
}
