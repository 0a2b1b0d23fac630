//! pipeconf Core - Core types for pipeline step configuration resolution
//!
//! This crate provides the data model shared across the pipeconf workspace:
//! - Parameter schemas (`ParameterSpec`, `StepSchema`)
//! - Configuration layers and their precedence (`ConfigLayer`, `LayerKind`)
//! - Raw and typed values (`RawValue`, `ParamValue`)
//! - The shared pipeline environment record
//! - Error types

pub mod environment;
pub mod error;
pub mod layer;
pub mod schema;
pub mod types;

// Re-export commonly used types
pub use environment::{EnvironmentEntry, EnvironmentKey, EnvironmentSnapshot, SharedEnvironment};
pub use error::{CoreError, Result, SchemaError};
pub use layer::{ConfigLayer, LayerKind, LayerSet, ValueSource};
pub use schema::{
    Alias, ParameterSpec, ResourceRef, Scope, StepOutput, StepSchema, StepSchemaBuilder,
};
pub use types::{ParamType, ParamValue, RawValue};
