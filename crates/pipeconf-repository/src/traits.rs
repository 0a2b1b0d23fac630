//! Core trait definitions for the repository pattern
//!
//! - [`StepRepository`]: loads step metadata and the pipeline configuration
//! - [`EnvironmentStore`]: loads and persists the shared pipeline environment
//!
//! # Examples
//!
//! ```no_run
//! use pipeconf_repository::{FileSystemRepository, RepositoryConfig, StepRepository};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = FileSystemRepository::new(
//!     RepositoryConfig::default().with_metadata_dir("resources/metadata"),
//! )?;
//!
//! let schema = repo.load_step("karmaExecuteTests").await?;
//! let config = repo.load_pipeline_config().await?;
//! let layers = config.layers_for(&schema, Some("Acceptance"));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use pipeconf_core::{SharedEnvironment, StepSchema};
use pipeconf_parser::PipelineConfig;

use crate::RepositoryResult;

/// Read access to step metadata and pipeline configuration
#[async_trait]
pub trait StepRepository: Send + Sync {
    /// Load a step schema by current or former step name
    async fn load_step(&self, name: &str) -> RepositoryResult<StepSchema>;

    /// Names of all steps this repository knows, sorted
    async fn list_steps(&self) -> RepositoryResult<Vec<String>>;

    /// Load the pipeline configuration document
    async fn load_pipeline_config(&self) -> RepositoryResult<PipelineConfig>;
}

/// Persistence of the shared pipeline environment
#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    /// Load every persisted entry
    async fn load(&self) -> RepositoryResult<SharedEnvironment>;

    /// Persist one entry; an entry that already exists is never overwritten
    async fn persist(&self, step: &str, path: &str, value: &str) -> RepositoryResult<()>;

    /// Remove an entry this process persisted for a run that did not complete.
    /// A missing entry is not an error.
    async fn discard(&self, step: &str, path: &str) -> RepositoryResult<()>;
}
