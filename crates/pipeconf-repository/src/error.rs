//! Error types for the repository layer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata or configuration document failed to parse
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: pipeconf_parser::ParseError,
    },

    /// No metadata document declares the step
    #[error("Step not found: {name}")]
    StepNotFound { name: String },

    /// Two metadata documents declare the same step
    #[error("Step '{name}' is declared in both {first} and {second}")]
    DuplicateStep {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Invalid path provided
    #[error("Invalid path: {path}")]
    InvalidPath { path: PathBuf },

    /// Shared environment path that would escape its step directory
    #[error("Invalid environment path '{step}/{path}'")]
    InvalidEnvironmentPath { step: String, path: String },

    /// Shared environment entry already persisted
    #[error("Value for '{step}/{path}' has already been recorded")]
    AlreadyRecorded { step: String, path: String },

    /// Error raised by core types
    #[error(transparent)]
    Core(#[from] pipeconf_core::CoreError),
}
