//! Configuration layers
//!
//! A layer is one already-loaded source of raw key/value pairs. Its
//! `LayerKind` fixes both its position in the precedence order and the scope
//! a parameter must declare before the layer is consulted for it.

use crate::error::CoreError;
use crate::schema::Scope;
use crate::types::RawValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Kind of configuration layer
///
/// Variants are declared in precedence order, highest first; the derived
/// `Ord` is the precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Explicit command-line flags
    Flags,
    /// Prefixed environment variables
    Environment,
    /// Parameters document handed over by the orchestrator
    Parameters,
    /// `steps.<step>` section of the configuration file
    Steps,
    /// `stages.<stage>` section of the configuration file
    Stages,
    /// `general` section of the configuration file
    General,
}

impl LayerKind {
    /// All kinds, highest priority first
    pub const PRECEDENCE: [LayerKind; 6] = [
        LayerKind::Flags,
        LayerKind::Environment,
        LayerKind::Parameters,
        LayerKind::Steps,
        LayerKind::Stages,
        LayerKind::General,
    ];

    /// Scope a parameter must declare for this layer to be consulted.
    /// `None` means the layer is always in scope.
    pub fn required_scope(&self) -> Option<Scope> {
        match self {
            LayerKind::Flags | LayerKind::Environment => None,
            LayerKind::Parameters => Some(Scope::Parameters),
            LayerKind::Steps => Some(Scope::Steps),
            LayerKind::Stages => Some(Scope::Stages),
            LayerKind::General => Some(Scope::General),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Flags => "flags",
            LayerKind::Environment => "environment",
            LayerKind::Parameters => "parameters",
            LayerKind::Steps => "steps",
            LayerKind::Stages => "stages",
            LayerKind::General => "general",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerKind::PRECEDENCE
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownLayerKind(s.to_string()))
    }
}

/// A named, read-only source of raw values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLayer {
    pub kind: LayerKind,

    /// Human-readable origin (file path, `PIPER_*`, `command line`, ...)
    pub name: String,

    pub entries: BTreeMap<String, RawValue>,
}

impl ConfigLayer {
    pub fn new(kind: LayerKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add an entry (builder style)
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The layers available to one invocation, at most one per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSet {
    layers: BTreeMap<LayerKind, ConfigLayer>,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer, returning the one it replaced
    pub fn insert(&mut self, layer: ConfigLayer) -> Option<ConfigLayer> {
        self.layers.insert(layer.kind, layer)
    }

    /// Add a layer (builder style)
    pub fn with_layer(mut self, layer: ConfigLayer) -> Self {
        self.insert(layer);
        self
    }

    pub fn get(&self, kind: LayerKind) -> Option<&ConfigLayer> {
        self.layers.get(&kind)
    }

    /// Layers in precedence order, highest first
    pub fn iter(&self) -> impl Iterator<Item = &ConfigLayer> {
        self.layers.values()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl FromIterator<ConfigLayer> for LayerSet {
    fn from_iter<T: IntoIterator<Item = ConfigLayer>>(iter: T) -> Self {
        let mut set = LayerSet::new();
        for layer in iter {
            set.insert(layer);
        }
        set
    }
}

/// Where a resolved value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ValueSource {
    /// A configuration layer; `key` is the spelling found there
    Layer {
        kind: LayerKind,
        layer: String,
        key: String,
    },
    /// A shared-environment entry
    Reference { step: String, path: String },
    /// The schema default
    Default,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Layer { kind, layer, key } => {
                write!(f, "{} layer '{}' (key '{}')", kind, layer, key)
            }
            ValueSource::Reference { step, path } => {
                write!(f, "shared environment '{}/{}'", step, path)
            }
            ValueSource::Default => f.write_str("schema default"),
        }
    }
}
