//! StepConfigResolver - resolves the options of named steps

use crate::catalog::StepCatalog;
use crate::config::ResolverConfig;
use crate::error::{Result, SdkError};
use crate::harness::StepHarness;
use crate::invocation::StepInvocation;
use crate::telemetry::TelemetrySink;
use pipeconf_core::{LayerSet, SharedEnvironment, StepSchema};
use pipeconf_parser::{find_similar, PipelineConfig};
use pipeconf_repository::{EnvironmentStore, RepositoryError, StepRepository};
use pipeconf_resolver::{
    EnvironmentLayerLoader, ResolutionEngine, ResolutionReporter, ResolvedOptions,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Resolves step options from every configuration source
///
/// Built with [`StepConfigResolverBuilder`](crate::StepConfigResolverBuilder).
/// The pipeline configuration and the persisted shared environment are
/// loaded once at build time.
pub struct StepConfigResolver {
    pub(crate) config: ResolverConfig,
    pub(crate) catalog: StepCatalog,
    pub(crate) repository: Arc<dyn StepRepository>,
    pub(crate) environment_store: Arc<dyn EnvironmentStore>,
    pub(crate) pipeline_config: PipelineConfig,
    pub(crate) environment: Arc<SharedEnvironment>,
    pub(crate) reporter: Arc<dyn ResolutionReporter>,
    pub(crate) telemetry: Arc<dyn TelemetrySink>,
}

impl StepConfigResolver {
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn pipeline_config(&self) -> &PipelineConfig {
        &self.pipeline_config
    }

    /// The shared environment of this pipeline run
    pub fn environment(&self) -> &Arc<SharedEnvironment> {
        &self.environment
    }

    /// Look up a step; the repository takes precedence over built-in steps
    pub async fn schema(&self, step: &str) -> Result<Arc<StepSchema>> {
        match self.repository.load_step(step).await {
            Ok(schema) => return Ok(Arc::new(schema)),
            Err(RepositoryError::StepNotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(schema) = self.catalog.get(step) {
            return Ok(schema);
        }

        let names = self.step_names().await?;
        Err(SdkError::UnknownStep {
            name: step.to_string(),
            suggestion: find_similar(step, names.iter().map(String::as_str)),
        })
    }

    /// Every known step name, sorted
    pub async fn step_names(&self) -> Result<Vec<String>> {
        let mut names: BTreeSet<String> = self.repository.list_steps().await?.into_iter().collect();
        names.extend(self.catalog.names().map(str::to_string));
        Ok(names.into_iter().collect())
    }

    /// All layers of one invocation
    pub fn layers(&self, schema: &StepSchema, invocation: &StepInvocation) -> LayerSet {
        let loader = EnvironmentLayerLoader::new(&self.config.env_prefix);
        let env_layer = match &invocation.env_vars {
            Some(vars) => {
                loader.load_from(schema, vars.iter().map(|(k, v)| (k.as_str(), v.clone())))
            }
            None => loader.load(schema),
        };

        let mut layers: LayerSet = self
            .pipeline_config
            .layers_for(schema, invocation.stage.as_deref())
            .into_iter()
            .collect();
        layers.insert(invocation.flags_layer());
        layers.insert(env_layer);
        if let Some(parameters) = &invocation.parameters {
            layers.insert(parameters.clone());
        }
        layers
    }

    /// Resolve a step's options against a snapshot of the shared environment
    pub fn resolve_schema(
        &self,
        schema: &StepSchema,
        invocation: &StepInvocation,
    ) -> Result<ResolvedOptions> {
        let layers = self.layers(schema, invocation);
        let snapshot = self.environment.snapshot();
        debug!(
            step = %schema.name(),
            layers = layers.len(),
            recorded = snapshot.len(),
            "Resolving step options"
        );

        Ok(ResolutionEngine::new(schema).resolve_with(
            &layers,
            &snapshot,
            self.reporter.as_ref(),
            &invocation.cancel,
        )?)
    }

    pub async fn resolve(
        &self,
        step: &str,
        invocation: &StepInvocation,
    ) -> Result<ResolvedOptions> {
        let schema = self.schema(step).await?;
        self.resolve_schema(&schema, invocation)
    }

    /// Harness that runs `step` and records its outputs
    pub fn harness(&self, step: impl Into<String>, invocation: StepInvocation) -> StepHarness<'_> {
        StepHarness::new(self, step.into(), invocation)
    }
}
