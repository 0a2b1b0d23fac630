//! Step harness
//!
//! Runs one step: resolves its options, executes the body and, only when the
//! body succeeds, records the values it produced in the shared environment.
//! A telemetry event is sent for every run, successful or not.

use crate::error::{Result, SdkError};
use crate::invocation::StepInvocation;
use crate::resolver::StepConfigResolver;
use crate::telemetry::TelemetryEvent;
use chrono::Utc;
use pipeconf_core::{CoreError, EnvironmentKey, StepSchema};
use pipeconf_resolver::ResolvedOptions;
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Instant;
use tracing::{info, warn};

/// Values a step produced for later steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutputs {
    entries: Vec<(EnvironmentKey, String)>,
}

impl StepOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value recorded under `<resource>/<path>`
    pub fn with(
        mut self,
        resource: impl Into<String>,
        path: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.entries.push((EnvironmentKey::new(resource, path), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EnvironmentKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of a successful step run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: String,
    /// Shared-environment keys written by the run
    pub recorded: Vec<EnvironmentKey>,
}

pub struct StepHarness<'r> {
    resolver: &'r StepConfigResolver,
    step: String,
    invocation: StepInvocation,
}

impl<'r> StepHarness<'r> {
    pub(crate) fn new(
        resolver: &'r StepConfigResolver,
        step: String,
        invocation: StepInvocation,
    ) -> Self {
        Self {
            resolver,
            step,
            invocation,
        }
    }

    /// Run `body` with the resolved options
    pub async fn run<F, Fut, E>(self, body: F) -> Result<StepReport>
    where
        F: FnOnce(ResolvedOptions) -> Fut,
        Fut: Future<Output = std::result::Result<StepOutputs, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(step = %self.step, "Running step");

        let result = self.execute(body).await;

        match &result {
            Ok(report) => {
                info!(step = %report.step, recorded = report.recorded.len(), "Step finished")
            }
            Err(e) => warn!(step = %self.step, error = %e, "Step failed"),
        }
        if self.resolver.config.telemetry {
            let event =
                TelemetryEvent::new(&self.step, started_at, clock.elapsed(), result.is_ok());
            self.resolver.telemetry.send(&event);
        }

        result
    }

    async fn execute<F, Fut, E>(&self, body: F) -> Result<StepReport>
    where
        F: FnOnce(ResolvedOptions) -> Fut,
        Fut: Future<Output = std::result::Result<StepOutputs, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let schema = self.resolver.schema(&self.step).await?;
        let options = self.resolver.resolve_schema(&schema, &self.invocation)?;

        let outputs = body(options).await.map_err(|e| SdkError::StepFailed {
            step: schema.name().to_string(),
            source: e.into(),
        })?;

        self.check_outputs(&schema, &outputs)?;

        // Disk first, then memory; a failure removes what this run persisted
        let store = &self.resolver.environment_store;
        let mut persisted: Vec<&EnvironmentKey> = Vec::with_capacity(outputs.len());
        for (key, value) in outputs.iter() {
            if let Err(e) = store.persist(&key.step, &key.path, value).await {
                self.roll_back(&persisted).await;
                return Err(e.into());
            }
            persisted.push(key);
        }

        let entries = outputs.iter().map(|(key, value)| (key.clone(), value.to_string()));
        if let Err(e) = self.resolver.environment.record_all(entries) {
            self.roll_back(&persisted).await;
            return Err(e.into());
        }
        let recorded = persisted.into_iter().cloned().collect();

        Ok(StepReport {
            step: schema.name().to_string(),
            recorded,
        })
    }

    /// Reject any output that could not be recorded, before anything is written
    fn check_outputs(&self, schema: &StepSchema, outputs: &StepOutputs) -> Result<()> {
        let step = schema.name();
        let snapshot = self.resolver.environment.snapshot();
        let mut seen = BTreeSet::new();
        for (key, _) in outputs.iter() {
            if !schema.declares_output(&key.step, &key.path) {
                return Err(SdkError::UndeclaredOutput {
                    step: step.to_string(),
                    resource: key.step.clone(),
                    path: key.path.clone(),
                });
            }
            if !seen.insert(key) {
                return Err(SdkError::DuplicateOutput {
                    step: step.to_string(),
                    resource: key.step.clone(),
                    path: key.path.clone(),
                });
            }
            if snapshot.entry(key).is_some() {
                return Err(CoreError::AlreadyRecorded {
                    step: key.step.clone(),
                    path: key.path.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    async fn roll_back(&self, persisted: &[&EnvironmentKey]) {
        for key in persisted {
            let discarded = self.resolver.environment_store.discard(&key.step, &key.path).await;
            if let Err(e) = discarded {
                warn!(step = %key.step, path = %key.path, error = %e, "Could not discard output");
            }
        }
    }
}
