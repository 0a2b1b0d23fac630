//! Type coercion and validation of merged values
//!
//! Every parameter is checked and every problem collected before reporting,
//! so one failed run lists all of them.

use crate::error::{ResolutionIssue, MASK};
use crate::merger::Candidate;
use pipeconf_core::{ParamType, ParamValue, ParameterSpec, RawValue, StepSchema, ValueSource};
use std::collections::BTreeMap;

/// A parameter value that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedValue {
    pub name: String,
    pub value: ParamValue,
    pub source: ValueSource,
    pub secret: bool,
}

/// Values of a step that passed validation with zero issues.
///
/// Only [`Validator::validate`] creates one.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    values: Vec<ValidatedValue>,
}

impl Validated {
    pub fn values(&self) -> &[ValidatedValue] {
        &self.values
    }

    pub(crate) fn into_values(self) -> Vec<ValidatedValue> {
        self.values
    }
}

/// Parse a boolean the way switches are written on command lines and in
/// environment variables: `1`, `t`, `true` and `0`, `f`, `false` in lower,
/// upper or title case
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

pub struct Validator;

impl Validator {
    /// Convert a raw value into the declared type
    pub fn coerce(param_type: ParamType, raw: &RawValue) -> Option<ParamValue> {
        match (param_type, raw) {
            (ParamType::String, RawValue::Text(s)) => Some(ParamValue::String(s.clone())),
            (ParamType::Bool, RawValue::Text(s)) => parse_bool(s).map(ParamValue::Bool),
            (ParamType::Int, RawValue::Text(s)) => {
                s.trim().parse::<i64>().ok().map(ParamValue::Int)
            }
            (ParamType::Float, RawValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(ParamValue::Float),
            (ParamType::StringList, RawValue::List(items)) => Some(ParamValue::List(items.clone())),
            (ParamType::StringList, RawValue::Text(s)) => Some(ParamValue::List(
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            (_, RawValue::List(_)) => None,
        }
    }

    /// Validate the merged candidates of every parameter of `schema`.
    ///
    /// Issues come back in parameter declaration order.
    pub fn validate(
        schema: &StepSchema,
        candidates: &BTreeMap<String, Candidate>,
    ) -> Result<Validated, Vec<ResolutionIssue>> {
        let mut issues = Vec::new();
        let mut values = Vec::new();

        for param in schema.parameters() {
            let Some(candidate) = candidates.get(&param.name) else {
                if param.mandatory {
                    issues.push(ResolutionIssue::MissingMandatoryValue {
                        parameter: param.name.clone(),
                    });
                }
                continue;
            };

            match Self::check(param, candidate) {
                // A list of blanks coerces to nothing
                Ok(value) if param.mandatory && Self::is_blank(&value) => {
                    issues.push(ResolutionIssue::MissingMandatoryValue {
                        parameter: param.name.clone(),
                    });
                }
                Ok(value) => values.push(ValidatedValue {
                    name: param.name.clone(),
                    value,
                    source: candidate.source.clone(),
                    secret: param.secret,
                }),
                Err(issue) => issues.push(issue),
            }
        }

        if issues.is_empty() {
            Ok(Validated { values })
        } else {
            Err(issues)
        }
    }

    fn check(param: &ParameterSpec, candidate: &Candidate) -> Result<ParamValue, ResolutionIssue> {
        let value = Self::coerce(param.param_type, &candidate.raw).ok_or_else(|| {
            ResolutionIssue::TypeMismatch {
                parameter: param.name.clone(),
                expected: param.param_type,
                raw: Self::display_raw(param, &candidate.raw.render()),
                source: candidate.source.clone(),
            }
        })?;

        if let Some(rejected) = Self::first_not_allowed(param, &value) {
            return Err(ResolutionIssue::ValueNotAllowed {
                parameter: param.name.clone(),
                value: Self::display_raw(param, &rejected),
                allowed: param.possible_values.clone(),
                source: candidate.source.clone(),
            });
        }

        Ok(value)
    }

    fn is_blank(value: &ParamValue) -> bool {
        match value {
            ParamValue::String(s) => s.trim().is_empty(),
            ParamValue::List(items) => items.iter().all(|item| item.trim().is_empty()),
            _ => false,
        }
    }

    fn first_not_allowed(param: &ParameterSpec, value: &ParamValue) -> Option<String> {
        if param.possible_values.is_empty() {
            return None;
        }
        let allowed = |v: &str| param.possible_values.iter().any(|p| p == v);
        match value {
            ParamValue::List(items) => items.iter().find(|item| !allowed(item)).cloned(),
            other => {
                let rendered = other.to_string();
                (!allowed(&rendered)).then_some(rendered)
            }
        }
    }

    fn display_raw(param: &ParameterSpec, raw: &str) -> String {
        if param.secret {
            MASK.to_string()
        } else {
            raw.to_string()
        }
    }
}
