//! Built-in step catalog
//!
//! Step metadata shipped with the SDK. Repositories may add or override steps
//! at runtime; the catalog is the fallback.

use crate::error::{Result, SdkError};
use pipeconf_core::StepSchema;
use pipeconf_parser::{find_similar, StepMetadataParser};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Metadata documents compiled into the binary
pub const BUILTIN_METADATA: &[(&str, &str)] = &[
    (
        "karmaExecuteTests",
        include_str!("../resources/metadata/karmaExecuteTests.yaml"),
    ),
    (
        "sonarExecuteScan",
        include_str!("../resources/metadata/sonarExecuteScan.yaml"),
    ),
];

/// Step schemas by step name
#[derive(Debug, Clone, Default)]
pub struct StepCatalog {
    steps: BTreeMap<String, Arc<StepSchema>>,
}

impl StepCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog of every built-in step
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::empty();
        for (_, content) in BUILTIN_METADATA {
            catalog.register_yaml(content)?;
        }
        debug!(steps = catalog.len(), "Loaded built-in step catalog");
        Ok(catalog)
    }

    /// Parse and register one metadata document
    pub fn register_yaml(&mut self, content: &str) -> Result<Arc<StepSchema>> {
        self.register(StepMetadataParser::parse(content)?)
    }

    pub fn register(&mut self, schema: StepSchema) -> Result<Arc<StepSchema>> {
        if self.steps.contains_key(schema.name()) {
            return Err(SdkError::DuplicateStep(schema.name().to_string()));
        }
        let schema = Arc::new(schema);
        self.steps.insert(schema.name().to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Look up a step by current or former name
    pub fn get(&self, name: &str) -> Option<Arc<StepSchema>> {
        self.steps
            .get(name)
            .or_else(|| self.steps.values().find(|schema| schema.answers_to(name)))
            .cloned()
    }

    /// Closest known step name, for error messages
    pub fn suggest(&self, name: &str) -> Option<String> {
        find_similar(name, self.steps.keys().map(String::as_str))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
