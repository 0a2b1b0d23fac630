//! Repository abstraction layer for pipeconf
//!
//! Loads step metadata documents and the pipeline configuration file, and
//! persists the shared pipeline environment between step invocations.
//!
//! # Features
//!
//! - **File System Repository**: step metadata and configuration from YAML files
//! - **Environment Store**: one file per shared-environment entry, never overwritten
//! - **Async API**: non-blocking I/O with Tokio
//!
//! # Layout
//!
//! ```text
//! .pipeline/
//! ├── config.yml                         pipeline configuration
//! └── commonPipelineEnvironment/
//!     └── github/
//!         └── owner                      shared-environment entry
//! ```

pub mod config;
pub mod environment_store;
pub mod error;
pub mod file_system;
pub mod traits;

// Re-exports - Configuration
pub use config::{RepositoryConfig, DEFAULT_CONFIG_FILE, DEFAULT_ENV_ROOT};

// Re-exports - Error
pub use error::{RepositoryError, RepositoryResult};

// Re-exports - Repositories
pub use environment_store::FileEnvironmentStore;
pub use file_system::FileSystemRepository;
pub use traits::*;
