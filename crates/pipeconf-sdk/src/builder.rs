//! Builder pattern for StepConfigResolver

use crate::catalog::StepCatalog;
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::resolver::StepConfigResolver;
use crate::telemetry::{TelemetrySink, TracingTelemetry};
use pipeconf_repository::{
    EnvironmentStore, FileEnvironmentStore, FileSystemRepository, RepositoryConfig, StepRepository,
};
use pipeconf_resolver::{ResolutionReporter, TracingReporter};
use std::sync::Arc;
use tracing::info;

/// Builder for StepConfigResolver
///
/// # Example
///
/// ```rust,ignore
/// use pipeconf_sdk::{RepositoryConfig, StepConfigResolverBuilder, StepInvocation};
///
/// // Built-in steps, `.pipeline/config.yml` and `.pipeline` as environment root
/// let resolver = StepConfigResolverBuilder::new().build().await?;
///
/// // Custom metadata directory and configuration file
/// let resolver = StepConfigResolverBuilder::new()
///     .with_repository_config(
///         RepositoryConfig::default()
///             .with_metadata_dir("resources/metadata")
///             .with_config_file("ci/config.yml"),
///     )
///     .enable_telemetry(false)
///     .build()
///     .await?;
///
/// let options = resolver
///     .resolve("karmaExecuteTests", &StepInvocation::new().with_stage("Acceptance"))
///     .await?;
/// ```
pub struct StepConfigResolverBuilder {
    config: ResolverConfig,
    catalog: Option<StepCatalog>,
    metadata_contents: Vec<String>,
    repository: Option<Arc<dyn StepRepository>>,
    environment_store: Option<Arc<dyn EnvironmentStore>>,
    reporter: Option<Arc<dyn ResolutionReporter>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl StepConfigResolverBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: ResolverConfig::new(),
            catalog: None,
            metadata_contents: Vec::new(),
            repository: None,
            environment_store: None,
            reporter: None,
            telemetry: None,
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Set where metadata, configuration and the shared environment live
    pub fn with_repository_config(mut self, repository: RepositoryConfig) -> Self {
        self.config.repository = repository;
        self
    }

    /// Set the prefix of parameter environment variables
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.env_prefix = prefix.into();
        self
    }

    /// Enable step telemetry
    pub fn enable_telemetry(mut self, enable: bool) -> Self {
        self.config.telemetry = enable;
        self
    }

    /// Replace the built-in step catalog
    pub fn with_catalog(mut self, catalog: StepCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Add step metadata content directly (alternative to a metadata directory)
    pub fn add_metadata_content(mut self, content: impl Into<String>) -> Self {
        self.metadata_contents.push(content.into());
        self
    }

    /// Use a custom step repository instead of the file system
    pub fn with_repository(mut self, repository: Arc<dyn StepRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Use a custom store for the shared environment
    pub fn with_environment_store(mut self, store: Arc<dyn EnvironmentStore>) -> Self {
        self.environment_store = Some(store);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ResolutionReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_telemetry_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// Build the resolver
    pub async fn build(self) -> Result<StepConfigResolver> {
        let mut catalog = match self.catalog {
            Some(catalog) => catalog,
            None => StepCatalog::builtin()?,
        };
        for content in &self.metadata_contents {
            catalog.register_yaml(content)?;
        }

        let repository: Arc<dyn StepRepository> = match self.repository {
            Some(repository) => repository,
            None => Arc::new(FileSystemRepository::new(self.config.repository.clone())?),
        };
        let environment_store: Arc<dyn EnvironmentStore> = match self.environment_store {
            Some(store) => store,
            None => Arc::new(FileEnvironmentStore::new(self.config.repository.env_root.clone())),
        };

        let pipeline_config = repository.load_pipeline_config().await?;
        let environment = environment_store.load().await?;

        info!(
            builtin_steps = catalog.len(),
            recorded = environment.len(),
            telemetry = self.config.telemetry,
            "Step configuration resolver ready"
        );

        Ok(StepConfigResolver {
            config: self.config,
            catalog,
            repository,
            environment_store,
            pipeline_config,
            environment: Arc::new(environment),
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
            telemetry: self.telemetry.unwrap_or_else(|| Arc::new(TracingTelemetry)),
        })
    }
}

impl Default for StepConfigResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
