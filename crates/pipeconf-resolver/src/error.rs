//! Resolution error types
//!
//! Validation problems are collected across all parameters and surfaced
//! together in one [`ResolutionReport`], so a user can fix everything in a
//! single pass.

use pipeconf_core::{ParamType, ValueSource};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Placeholder shown instead of secret values
pub const MASK: &str = "****";

/// One problem found while validating merged values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionIssue {
    /// Mandatory parameter without a value after the full merge
    MissingMandatoryValue { parameter: String },

    /// Raw value does not parse into the declared type
    TypeMismatch {
        parameter: String,
        expected: ParamType,
        raw: String,
        source: ValueSource,
    },

    /// Value is not among the declared possible values
    ValueNotAllowed {
        parameter: String,
        value: String,
        allowed: Vec<String>,
        source: ValueSource,
    },
}

impl ResolutionIssue {
    pub fn parameter(&self) -> &str {
        match self {
            ResolutionIssue::MissingMandatoryValue { parameter }
            | ResolutionIssue::TypeMismatch { parameter, .. }
            | ResolutionIssue::ValueNotAllowed { parameter, .. } => parameter,
        }
    }

    /// Short machine-friendly kind name
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionIssue::MissingMandatoryValue { .. } => "missing_mandatory_value",
            ResolutionIssue::TypeMismatch { .. } => "type_mismatch",
            ResolutionIssue::ValueNotAllowed { .. } => "value_not_allowed",
        }
    }
}

impl fmt::Display for ResolutionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionIssue::MissingMandatoryValue { parameter } => {
                write!(f, "{}: mandatory parameter has no value", parameter)
            }
            ResolutionIssue::TypeMismatch {
                parameter,
                expected,
                raw,
                source,
            } => write!(
                f,
                "{}: value '{}' from {} is not a valid {}",
                parameter, raw, source, expected
            ),
            ResolutionIssue::ValueNotAllowed {
                parameter,
                value,
                allowed,
                source,
            } => write!(
                f,
                "{}: value '{}' from {} is not one of [{}]",
                parameter,
                value,
                source,
                allowed.join(", ")
            ),
        }
    }
}

/// Every issue found for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub step: String,
    pub issues: Vec<ResolutionIssue>,
}

impl ResolutionReport {
    /// Names of the mandatory parameters left without a value
    pub fn missing_parameters(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|i| matches!(i, ResolutionIssue::MissingMandatoryValue { .. }))
            .map(ResolutionIssue::parameter)
            .collect()
    }

    pub fn issues_for(&self, parameter: &str) -> impl Iterator<Item = &ResolutionIssue> {
        let parameter = parameter.to_string();
        self.issues.iter().filter(move |i| i.parameter() == parameter)
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Configuration of step '{}' is invalid ({} problem{}):",
            self.step,
            self.issues.len(),
            if self.issues.len() == 1 { "" } else { "s" }
        )?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

/// Resolution error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Validation failed; the report lists every problem
    #[error("{0}")]
    Invalid(ResolutionReport),

    /// The invoking harness cancelled the resolution
    #[error("Resolution of step '{step}' was cancelled")]
    Cancelled { step: String },
}

impl ResolutionError {
    /// The validation report, if this is a validation failure
    pub fn report(&self) -> Option<&ResolutionReport> {
        match self {
            ResolutionError::Invalid(report) => Some(report),
            ResolutionError::Cancelled { .. } => None,
        }
    }
}

/// Result type for resolution operations
pub type Result<T> = std::result::Result<T, ResolutionError>;
