//! Shared-environment fallback
//!
//! A parameter left without a value by every eligible layer may declare
//! references into values recorded by earlier steps. References are tried in
//! declared order; the first one present with a non-empty value wins.

use crate::merger::Candidate;
use pipeconf_core::{EnvironmentSnapshot, ParameterSpec, RawValue, ResourceRef, ValueSource};

/// A declared reference with nothing recorded under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub parameter: String,
    pub reference: ResourceRef,
}

/// Result of walking one parameter's references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceOutcome {
    pub value: Option<Candidate>,
    /// References tried before the winner (or all of them when none matched)
    pub unresolved: Vec<UnresolvedReference>,
}

pub struct ReferenceResolver;

impl ReferenceResolver {
    pub fn resolve(param: &ParameterSpec, snapshot: &EnvironmentSnapshot) -> ReferenceOutcome {
        let mut outcome = ReferenceOutcome::default();

        for reference in &param.resource_refs {
            match snapshot
                .get(&reference.step, &reference.path)
                .filter(|value| !value.is_empty())
            {
                Some(value) => {
                    outcome.value = Some(Candidate::new(
                        RawValue::text(value),
                        ValueSource::Reference {
                            step: reference.step.clone(),
                            path: reference.path.clone(),
                        },
                    ));
                    break;
                }
                None => outcome.unresolved.push(UnresolvedReference {
                    parameter: param.name.clone(),
                    reference: reference.clone(),
                }),
            }
        }

        outcome
    }
}
