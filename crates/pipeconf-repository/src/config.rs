//! Repository configuration types
//!
//! Locations the file-system repository reads from and writes to.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the pipeline configuration file
pub const DEFAULT_CONFIG_FILE: &str = ".pipeline/config.yml";

/// Default root of the persisted shared environment
pub const DEFAULT_ENV_ROOT: &str = ".pipeline";

/// Repository configuration
///
/// # Examples
///
/// ```rust
/// use pipeconf_repository::RepositoryConfig;
///
/// // Defaults: `.pipeline/config.yml` and `.pipeline` as environment root
/// let config = RepositoryConfig::default();
///
/// // Custom step metadata directory and configuration file
/// let config = RepositoryConfig::default()
///     .with_metadata_dir("resources/metadata")
///     .with_config_file("ci/config.yml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Directory of step metadata documents; built-in steps only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_dir: Option<PathBuf>,

    /// Pipeline configuration file; a missing file is an empty configuration
    pub config_file: PathBuf,

    /// Root directory of the shared environment (`<env_root>/<step>/<path>`)
    pub env_root: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            metadata_dir: None,
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            env_root: PathBuf::from(DEFAULT_ENV_ROOT),
        }
    }
}

impl RepositoryConfig {
    pub fn with_metadata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.metadata_dir = Some(dir.into());
        self
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = path.into();
        self
    }

    pub fn with_env_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_root = path.into();
        self
    }

    /// Resolve every relative location against `base`
    pub fn rooted_at(mut self, base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        self.metadata_dir = self.metadata_dir.as_deref().map(join);
        self.config_file = join(&self.config_file);
        self.env_root = join(&self.env_root);
        self
    }
}
