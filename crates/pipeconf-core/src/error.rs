//! Error types for pipeconf Core

use thiserror::Error;

/// Schema authoring error
///
/// Raised while a `StepSchema` is constructed. These are fatal: a schema that
/// fails here is never used for any invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Step '{step}' declares parameter '{name}' more than once")]
    DuplicateParameter { step: String, name: String },

    #[error(
        "Step '{step}': alias '{alias}' of parameter '{second}' is already claimed by parameter '{first}'"
    )]
    AliasCollision {
        step: String,
        alias: String,
        first: String,
        second: String,
    },

    #[error("Step schema must have a non-empty name")]
    EmptyStepName,

    #[error("Step '{step}' declares a parameter with an empty name")]
    EmptyParameterName { step: String },
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown scope: {0}")]
    UnknownScope(String),

    #[error("Unknown parameter type: {0}")]
    UnknownType(String),

    #[error("Unknown layer kind: {0}")]
    UnknownLayerKind(String),

    #[error("Environment entry '{step}/{path}' was already recorded in this run")]
    AlreadyRecorded { step: String, path: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
