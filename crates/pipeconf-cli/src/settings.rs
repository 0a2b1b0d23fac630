//! Command line settings
//!
//! Read from an optional `pipeconf.toml` plus `PIPECONF_*` environment
//! variables. General flags on the command line override them.

use anyhow::Result;
use pipeconf_sdk::{RepositoryConfig, ResolverConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::args::Cli;

/// Settings file looked up in the working directory (any `config` format)
pub const SETTINGS_FILE: &str = "pipeconf";

/// Prefix of settings environment variables
pub const SETTINGS_ENV_PREFIX: &str = "PIPECONF";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    /// Pipeline configuration file
    pub config_file: PathBuf,

    /// Root of the persisted shared environment
    pub env_root: PathBuf,

    /// Directory of additional step metadata documents
    pub metadata_dir: Option<PathBuf>,

    /// Prefix of parameter environment variables
    pub env_prefix: String,

    /// Send telemetry events for step runs
    pub telemetry: bool,
}

impl Default for CliSettings {
    fn default() -> Self {
        let resolver = ResolverConfig::default();
        Self {
            config_file: resolver.repository.config_file,
            env_root: resolver.repository.env_root,
            metadata_dir: None,
            env_prefix: resolver.env_prefix,
            telemetry: resolver.telemetry,
        }
    }
}

impl CliSettings {
    /// Load settings from `.env`, the settings file and the environment
    pub fn load() -> Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    /// Load settings from `file` (extension optional) and the environment
    pub fn load_from(file: &Path) -> Result<Self> {
        let file = file.to_string_lossy();
        let built = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(config::Environment::with_prefix(SETTINGS_ENV_PREFIX))
            .build();

        match built {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("Failed to deserialize settings: {}", e)),
            Err(e) => {
                tracing::info!(error = %e, "No usable settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Resolver configuration with the general flags applied
    pub fn resolver_config(&self, cli: &Cli) -> ResolverConfig {
        let mut repository = RepositoryConfig::default()
            .with_config_file(cli.config.clone().unwrap_or_else(|| self.config_file.clone()))
            .with_env_root(cli.env_root.clone().unwrap_or_else(|| self.env_root.clone()));
        if let Some(dir) = cli.metadata_dir.clone().or_else(|| self.metadata_dir.clone()) {
            repository = repository.with_metadata_dir(dir);
        }

        ResolverConfig::new()
            .with_repository(repository)
            .with_env_prefix(self.env_prefix.clone())
            .with_telemetry(self.telemetry && !cli.no_telemetry)
    }
}
