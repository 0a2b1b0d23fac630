//! pipeconf Resolver - layered configuration resolution
//!
//! Turns a step schema, a set of configuration layers and a snapshot of the
//! shared pipeline environment into validated, typed options:
//!
//! - [`ScopeFilter`] picks the layers a parameter may be read from
//! - [`PrecedenceMerger`] keeps the highest-precedence non-empty value
//! - [`ReferenceResolver`] falls back to values recorded by earlier steps
//! - [`Validator`] coerces types and collects every problem
//! - [`ResolutionEngine`] drives the phases and reports progress

pub mod alias;
pub mod cancel;
pub mod engine;
pub mod env_layer;
pub mod error;
pub mod merger;
pub mod options;
pub mod reference;
pub mod report;
pub mod scope;
pub mod validator;

pub use alias::{AliasMatch, AliasResolver, UnknownKey};
pub use cancel::CancellationFlag;
pub use engine::ResolutionEngine;
pub use env_layer::{EnvironmentLayerLoader, DEFAULT_ENV_PREFIX};
pub use error::{ResolutionError, ResolutionIssue, ResolutionReport, Result, MASK};
pub use merger::{Candidate, PrecedenceMerger};
pub use options::ResolvedOptions;
pub use reference::{ReferenceOutcome, ReferenceResolver, UnresolvedReference};
pub use report::{NoopReporter, ResolutionPhase, ResolutionReporter, TracingReporter};
pub use scope::ScopeFilter;
pub use validator::{parse_bool, Validated, ValidatedValue, Validator};
