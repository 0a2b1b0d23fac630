//! Configuration types for StepConfigResolver

use pipeconf_repository::RepositoryConfig;
use pipeconf_resolver::DEFAULT_ENV_PREFIX;
use serde::{Deserialize, Serialize};

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Where metadata, configuration and the shared environment live
    pub repository: RepositoryConfig,

    /// Prefix of environment variables read as parameter values
    pub env_prefix: String,

    /// Send a telemetry event per step run
    pub telemetry: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryConfig::default(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            telemetry: true,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(mut self, repository: RepositoryConfig) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn with_telemetry(mut self, enabled: bool) -> Self {
        self.telemetry = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::new();
        assert_eq!(config.env_prefix, "PIPER_");
        assert!(config.telemetry);
        assert_eq!(config.repository, RepositoryConfig::default());
    }

    #[test]
    fn test_builder_methods() {
        let config = ResolverConfig::new()
            .with_env_prefix("CI_")
            .with_telemetry(false)
            .with_repository(RepositoryConfig::default().with_env_root("/tmp/env"));
        assert_eq!(config.env_prefix, "CI_");
        assert!(!config.telemetry);
        assert_eq!(config.repository.env_root, std::path::PathBuf::from("/tmp/env"));
    }
}
