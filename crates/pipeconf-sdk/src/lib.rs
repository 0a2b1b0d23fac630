//! pipeconf SDK
//!
//! High-level API for resolving step options and running steps: a built-in
//! step catalog, a resolver that gathers every configuration source, and a
//! harness that records step outputs in the shared pipeline environment.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod harness;
pub mod invocation;
pub mod resolver;
pub mod telemetry;

// Re-export main types
pub use builder::StepConfigResolverBuilder;
pub use catalog::{StepCatalog, BUILTIN_METADATA};
pub use config::ResolverConfig;
pub use error::{Result, SdkError};
pub use harness::{StepHarness, StepOutputs, StepReport};
pub use invocation::StepInvocation;
pub use resolver::StepConfigResolver;
pub use telemetry::{NoopTelemetry, TelemetryEvent, TelemetrySink, TracingTelemetry};

// Re-export commonly used types from dependencies
pub use pipeconf_core::{ParamValue, RawValue, StepSchema, ValueSource};
pub use pipeconf_repository::RepositoryConfig;
pub use pipeconf_resolver::{CancellationFlag, ResolutionError, ResolvedOptions};
