//! Resolution progress reporting
//!
//! The engine never logs directly. It hands phase changes, value choices
//! and non-fatal notices to a [`ResolutionReporter`], so a harness can
//! forward them wherever it likes.

use crate::error::ResolutionReport;
use crate::reference::UnresolvedReference;
use pipeconf_core::{ConfigLayer, ValueSource};
use std::fmt;
use tracing::{debug, warn};

/// Lifecycle of one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionPhase {
    Unresolved,
    Filtering,
    Merging,
    ReferenceFallback,
    Validating,
    Resolved,
    Failed,
}

impl ResolutionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResolutionPhase::Resolved | ResolutionPhase::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPhase::Unresolved => "unresolved",
            ResolutionPhase::Filtering => "filtering",
            ResolutionPhase::Merging => "merging",
            ResolutionPhase::ReferenceFallback => "reference_fallback",
            ResolutionPhase::Validating => "validating",
            ResolutionPhase::Resolved => "resolved",
            ResolutionPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for ResolutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives resolution events; every method defaults to doing nothing
pub trait ResolutionReporter: Send + Sync {
    fn on_phase(&self, _step: &str, _from: ResolutionPhase, _to: ResolutionPhase) {}

    /// `secret` is set when the value must not be shown
    fn on_value(&self, _step: &str, _parameter: &str, _source: &ValueSource, _secret: bool) {}

    fn on_deprecated_alias(&self, _step: &str, _parameter: &str, _alias: &str, _layer: &str) {}

    fn on_unresolved_reference(&self, _step: &str, _notice: &UnresolvedReference) {}

    fn on_unknown_key(
        &self,
        _step: &str,
        _layer: &ConfigLayer,
        _key: &str,
        _suggestion: Option<&str>,
    ) {
    }

    fn on_failed(&self, _report: &ResolutionReport) {}
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ResolutionReporter for NoopReporter {}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ResolutionReporter for TracingReporter {
    fn on_phase(&self, step: &str, from: ResolutionPhase, to: ResolutionPhase) {
        debug!(step = %step, from = %from, to = %to, "Resolution phase changed");
    }

    fn on_value(&self, step: &str, parameter: &str, source: &ValueSource, secret: bool) {
        debug!(
            step = %step,
            parameter = %parameter,
            secret,
            source = %source,
            "Parameter value chosen"
        );
    }

    fn on_deprecated_alias(&self, step: &str, parameter: &str, alias: &str, layer: &str) {
        warn!(
            step = %step,
            parameter = %parameter,
            alias = %alias,
            layer = %layer,
            "Deprecated parameter name used; please switch to '{}'",
            parameter
        );
    }

    fn on_unresolved_reference(&self, step: &str, notice: &UnresolvedReference) {
        debug!(
            step = %step,
            parameter = %notice.parameter,
            reference = %notice.reference,
            "No value recorded for reference"
        );
    }

    fn on_unknown_key(&self, step: &str, layer: &ConfigLayer, key: &str, suggestion: Option<&str>) {
        match suggestion {
            Some(suggestion) => warn!(
                step = %step,
                layer = %layer.name,
                "Unknown parameter '{}'. Did you mean '{}'?",
                key,
                suggestion
            ),
            None => warn!(step = %step, layer = %layer.name, "Unknown parameter '{}'", key),
        }
    }

    fn on_failed(&self, report: &ResolutionReport) {
        warn!(step = %report.step, issues = report.issues.len(), "{}", report);
    }
}
