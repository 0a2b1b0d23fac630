//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Parser error
    #[error("Parser error: {0}")]
    ParseError(#[from] pipeconf_parser::ParseError),

    /// Resolution failed; the message lists every problem
    #[error(transparent)]
    ResolutionError(#[from] pipeconf_resolver::ResolutionError),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(#[from] pipeconf_repository::RepositoryError),

    /// Shared environment or schema error
    #[error(transparent)]
    CoreError(#[from] pipeconf_core::CoreError),

    /// Neither the repository nor the built-in catalog knows the step
    #[error("Unknown step '{name}'{}", did_you_mean(.suggestion))]
    UnknownStep {
        name: String,
        suggestion: Option<String>,
    },

    /// Two metadata documents declare the same step
    #[error("Step '{0}' is already registered")]
    DuplicateStep(String),

    /// A step tried to record an output its metadata does not declare
    #[error("Step '{step}' did not declare output '{resource}/{path}'")]
    UndeclaredOutput {
        step: String,
        resource: String,
        path: String,
    },

    /// A step returned the same output twice
    #[error("Step '{step}' returned output '{resource}/{path}' more than once")]
    DuplicateOutput {
        step: String,
        resource: String,
        path: String,
    },

    /// The step body returned an error
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(". Did you mean '{}'?", s))
        .unwrap_or_default()
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_step_with_suggestion() {
        let error = SdkError::UnknownStep {
            name: "karmaExecuteTest".to_string(),
            suggestion: Some("karmaExecuteTests".to_string()),
        };
        assert_eq!(
            error.to_string(),
            "Unknown step 'karmaExecuteTest'. Did you mean 'karmaExecuteTests'?"
        );

        let error = SdkError::UnknownStep {
            name: "mavenBuild".to_string(),
            suggestion: None,
        };
        assert_eq!(error.to_string(), "Unknown step 'mavenBuild'");
    }

    #[test]
    fn test_undeclared_output() {
        let error = SdkError::UndeclaredOutput {
            step: "mavenBuild".to_string(),
            resource: "commonPipelineEnvironment".to_string(),
            path: "artifactVersion".to_string(),
        };
        assert!(error.to_string().contains("commonPipelineEnvironment/artifactVersion"));
    }

    #[test]
    fn test_step_failed_keeps_source() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "karma.conf.js missing");
        let error = SdkError::StepFailed {
            step: "karmaExecuteTests".to_string(),
            source: Box::new(io_error),
        };
        assert!(error.to_string().contains("karma.conf.js missing"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_core_error_conversion() {
        let core = pipeconf_core::CoreError::AlreadyRecorded {
            step: "s".to_string(),
            path: "p".to_string(),
        };
        let sdk_error: SdkError = core.into();
        assert!(matches!(sdk_error, SdkError::CoreError(_)));
    }
}
