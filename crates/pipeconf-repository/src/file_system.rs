//! File system based repository implementation

use async_trait::async_trait;
use path_absolutize::Absolutize;
use pipeconf_core::StepSchema;
use pipeconf_parser::{PipelineConfig, PipelineConfigParser, StepMetadataParser};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::RepositoryConfig, error::RepositoryError, traits::StepRepository, RepositoryResult,
};

/// Step schemas found in the metadata directory, keyed by step name
type StepIndex = BTreeMap<String, (PathBuf, StepSchema)>;

/// File system based repository
///
/// Reads step metadata documents from a directory and the pipeline
/// configuration from a YAML file. The metadata directory is scanned once and
/// cached.
pub struct FileSystemRepository {
    metadata_dir: Option<PathBuf>,
    config_file: PathBuf,
    /// Configuration path as given; names the configuration layers
    config_origin: String,
    index: RwLock<Option<Arc<StepIndex>>>,
}

impl FileSystemRepository {
    /// Create a new file system repository
    ///
    /// # Example
    /// ```no_run
    /// use pipeconf_repository::{FileSystemRepository, RepositoryConfig};
    ///
    /// let repo = FileSystemRepository::new(RepositoryConfig::default()).unwrap();
    /// ```
    pub fn new(config: RepositoryConfig) -> RepositoryResult<Self> {
        let metadata_dir = match &config.metadata_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(RepositoryError::InvalidPath { path: dir.clone() });
                }
                Some(absolutize(dir)?)
            }
            None => None,
        };

        Ok(Self {
            metadata_dir,
            config_file: absolutize(&config.config_file)?,
            config_origin: config.config_file.display().to_string(),
            index: RwLock::new(None),
        })
    }

    pub fn metadata_dir(&self) -> Option<&Path> {
        self.metadata_dir.as_deref()
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Drop the cached metadata index so the next lookup rescans
    pub async fn clear_cache(&self) {
        *self.index.write().await = None;
    }

    async fn index(&self) -> RepositoryResult<Arc<StepIndex>> {
        if let Some(index) = self.index.read().await.as_ref() {
            return Ok(Arc::clone(index));
        }

        let mut guard = self.index.write().await;
        if let Some(index) = guard.as_ref() {
            return Ok(Arc::clone(index));
        }

        let mut index = StepIndex::new();
        if let Some(dir) = &self.metadata_dir {
            self.scan_dir(dir, &mut index).await?;
        }
        debug!(steps = index.len(), "Indexed step metadata");

        let index = Arc::new(index);
        *guard = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Recursively parse every YAML document below `dir`
    async fn scan_dir(&self, dir: &Path, index: &mut StepIndex) -> RepositoryResult<()> {
        let mut entries = fs::read_dir(dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }
        // Directory order is platform dependent
        paths.sort();

        for path in paths {
            if path.is_dir() {
                Box::pin(self.scan_dir(&path, index)).await?;
            } else if is_yaml(&path) {
                let content = fs::read_to_string(&path).await?;
                let schema =
                    StepMetadataParser::parse(&content).map_err(|source| RepositoryError::Parse {
                        path: path.clone(),
                        source,
                    })?;

                if let Some((first, _)) = index.get(schema.name()) {
                    return Err(RepositoryError::DuplicateStep {
                        name: schema.name().to_string(),
                        first: first.clone(),
                        second: path,
                    });
                }
                debug!(step = %schema.name(), path = %path.display(), "Loaded step metadata");
                index.insert(schema.name().to_string(), (path, schema));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StepRepository for FileSystemRepository {
    async fn load_step(&self, name: &str) -> RepositoryResult<StepSchema> {
        let index = self.index().await?;

        if let Some((_, schema)) = index.get(name) {
            return Ok(schema.clone());
        }
        index
            .values()
            .map(|(_, schema)| schema)
            .find(|schema| schema.answers_to(name))
            .cloned()
            .ok_or_else(|| RepositoryError::StepNotFound {
                name: name.to_string(),
            })
    }

    async fn list_steps(&self) -> RepositoryResult<Vec<String>> {
        Ok(self.index().await?.keys().cloned().collect())
    }

    async fn load_pipeline_config(&self) -> RepositoryResult<PipelineConfig> {
        if !fs::try_exists(&self.config_file).await? {
            debug!(path = %self.config_file.display(), "No pipeline configuration file");
            return Ok(PipelineConfig::empty(&self.config_origin));
        }

        let content = fs::read_to_string(&self.config_file).await?;
        PipelineConfigParser::parse(&content, &self.config_origin).map_err(|source| {
            RepositoryError::Parse {
                path: self.config_file.clone(),
                source,
            }
        })
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn absolutize(path: &Path) -> RepositoryResult<PathBuf> {
    Ok(path.absolutize()?.to_path_buf())
}
