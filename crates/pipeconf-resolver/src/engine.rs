//! Resolution engine
//!
//! Drives one step invocation through the resolution phases:
//!
//! ```text
//! Unresolved -> Filtering -> Merging -> ReferenceFallback -> Validating -> Resolved | Failed
//! ```
//!
//! Every phase change goes to the reporter. The cancellation flag is checked
//! between parameters; a cancelled run ends in `Failed` and yields no options.

use crate::alias::AliasResolver;
use crate::cancel::CancellationFlag;
use crate::error::{ResolutionError, ResolutionReport, Result};
use crate::merger::{Candidate, PrecedenceMerger};
use crate::options::ResolvedOptions;
use crate::reference::ReferenceResolver;
use crate::report::{ResolutionPhase, ResolutionReporter, TracingReporter};
use crate::scope::ScopeFilter;
use crate::validator::Validator;
use pipeconf_core::{ConfigLayer, EnvironmentSnapshot, LayerKind, LayerSet, StepSchema, ValueSource};
use std::collections::BTreeMap;

/// Layers whose keys are expected to belong to this step alone
const STEP_LOCAL_LAYERS: [LayerKind; 2] = [LayerKind::Flags, LayerKind::Steps];

/// Resolves the options of one step from its layers and the shared environment
#[derive(Debug, Clone, Copy)]
pub struct ResolutionEngine<'s> {
    schema: &'s StepSchema,
}

impl<'s> ResolutionEngine<'s> {
    pub fn new(schema: &'s StepSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &StepSchema {
        self.schema
    }

    /// Resolve with the tracing reporter and no cancellation
    pub fn resolve(
        &self,
        layers: &LayerSet,
        snapshot: &EnvironmentSnapshot,
    ) -> Result<ResolvedOptions> {
        self.resolve_with(layers, snapshot, &TracingReporter, &CancellationFlag::new())
    }

    pub fn resolve_with(
        &self,
        layers: &LayerSet,
        snapshot: &EnvironmentSnapshot,
        reporter: &dyn ResolutionReporter,
        cancel: &CancellationFlag,
    ) -> Result<ResolvedOptions> {
        let mut run = Run {
            step: self.schema.name(),
            phase: ResolutionPhase::Unresolved,
            reporter,
            cancel,
        };

        // Filtering
        run.enter(ResolutionPhase::Filtering)?;
        let mut eligible: Vec<Vec<&ConfigLayer>> =
            Vec::with_capacity(self.schema.parameters().len());
        for param in self.schema.parameters() {
            run.checkpoint()?;
            eligible.push(ScopeFilter::eligible(param, layers));
        }
        for layer in layers.iter().filter(|l| STEP_LOCAL_LAYERS.contains(&l.kind)) {
            for unknown in AliasResolver::unknown_keys(self.schema, layer) {
                reporter.on_unknown_key(
                    run.step,
                    layer,
                    &unknown.key,
                    unknown.suggestion.as_deref(),
                );
            }
        }

        // Merging
        run.enter(ResolutionPhase::Merging)?;
        let mut candidates: BTreeMap<String, Candidate> = BTreeMap::new();
        for (param, layers) in self.schema.parameters().iter().zip(&eligible) {
            run.checkpoint()?;
            let Some(candidate) = PrecedenceMerger::merge(param, layers) else {
                continue;
            };
            if let (Some(alias), ValueSource::Layer { layer, .. }) =
                (&candidate.via_alias, &candidate.source)
            {
                if alias.deprecated {
                    reporter.on_deprecated_alias(run.step, &param.name, &alias.name, layer);
                }
            }
            candidates.insert(param.name.clone(), candidate);
        }

        // Reference fallback, then defaults
        run.enter(ResolutionPhase::ReferenceFallback)?;
        for param in self.schema.parameters() {
            if candidates.contains_key(&param.name) {
                continue;
            }
            run.checkpoint()?;

            let outcome = ReferenceResolver::resolve(param, snapshot);
            for notice in &outcome.unresolved {
                reporter.on_unresolved_reference(run.step, notice);
            }
            let fallback = outcome.value.or_else(|| {
                param
                    .default
                    .as_ref()
                    .filter(|d| !d.is_empty())
                    .map(|d| Candidate::new(d.clone(), ValueSource::Default))
            });
            if let Some(candidate) = fallback {
                candidates.insert(param.name.clone(), candidate);
            }
        }

        // Validating
        run.enter(ResolutionPhase::Validating)?;
        match Validator::validate(self.schema, &candidates) {
            Ok(validated) => {
                for value in validated.values() {
                    reporter.on_value(run.step, &value.name, &value.source, value.secret);
                }
                run.enter(ResolutionPhase::Resolved)?;
                Ok(ResolvedOptions::from_validated(run.step, validated))
            }
            Err(issues) => {
                let report = ResolutionReport {
                    step: run.step.to_string(),
                    issues,
                };
                reporter.on_failed(&report);
                run.transition(ResolutionPhase::Failed);
                Err(ResolutionError::Invalid(report))
            }
        }
    }
}

/// State of one in-flight resolution
struct Run<'a> {
    step: &'a str,
    phase: ResolutionPhase,
    reporter: &'a dyn ResolutionReporter,
    cancel: &'a CancellationFlag,
}

impl Run<'_> {
    fn transition(&mut self, next: ResolutionPhase) {
        self.reporter.on_phase(self.step, self.phase, next);
        self.phase = next;
    }

    /// Move to `next` unless the run was cancelled
    fn enter(&mut self, next: ResolutionPhase) -> Result<()> {
        self.checkpoint()?;
        self.transition(next);
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<()> {
        if !self.cancel.is_cancelled() {
            return Ok(());
        }
        if !self.phase.is_terminal() {
            self.transition(ResolutionPhase::Failed);
        }
        Err(ResolutionError::Cancelled {
            step: self.step.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeconf_core::{ParameterSpec, Scope, SharedEnvironment};
    use std::sync::Mutex;

    #[derive(Default)]
    struct PhaseRecorder {
        phases: Mutex<Vec<ResolutionPhase>>,
        cancel_at: Option<(ResolutionPhase, CancellationFlag)>,
    }

    impl ResolutionReporter for PhaseRecorder {
        fn on_phase(&self, _step: &str, _from: ResolutionPhase, to: ResolutionPhase) {
            self.phases.lock().unwrap().push(to);
            if let Some((phase, flag)) = &self.cancel_at {
                if *phase == to {
                    flag.cancel();
                }
            }
        }
    }

    fn schema() -> StepSchema {
        StepSchema::builder("karmaExecuteTests")
            .parameter(
                ParameterSpec::string("modulePath")
                    .mandatory()
                    .with_scopes([Scope::Steps])
                    .with_default("."),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_phase_sequence_on_success() {
        let schema = schema();
        let recorder = PhaseRecorder::default();
        let options = ResolutionEngine::new(&schema)
            .resolve_with(
                &LayerSet::new(),
                &SharedEnvironment::new().snapshot(),
                &recorder,
                &CancellationFlag::new(),
            )
            .unwrap();

        assert_eq!(options.get_str("modulePath"), Some("."));
        assert_eq!(
            *recorder.phases.lock().unwrap(),
            vec![
                ResolutionPhase::Filtering,
                ResolutionPhase::Merging,
                ResolutionPhase::ReferenceFallback,
                ResolutionPhase::Validating,
                ResolutionPhase::Resolved,
            ]
        );
    }

    #[test]
    fn test_cancellation_mid_run() {
        let schema = schema();
        let flag = CancellationFlag::new();
        let recorder = PhaseRecorder {
            cancel_at: Some((ResolutionPhase::Merging, flag.clone())),
            ..Default::default()
        };

        let err = ResolutionEngine::new(&schema)
            .resolve_with(&LayerSet::new(), &SharedEnvironment::new().snapshot(), &recorder, &flag)
            .unwrap_err();

        assert!(matches!(
            err,
            ResolutionError::Cancelled { ref step } if step == "karmaExecuteTests"
        ));
        assert_eq!(
            *recorder.phases.lock().unwrap(),
            vec![
                ResolutionPhase::Filtering,
                ResolutionPhase::Merging,
                ResolutionPhase::Failed,
            ]
        );
    }

    #[test]
    fn test_cancelled_before_start() {
        let schema = schema();
        let flag = CancellationFlag::new();
        flag.cancel();
        let err = ResolutionEngine::new(&schema)
            .resolve_with(
                &LayerSet::new(),
                &SharedEnvironment::new().snapshot(),
                &crate::report::NoopReporter,
                &flag,
            )
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Cancelled { .. }));
    }
}
