//! Shared pipeline environment on disk
//!
//! Every entry is one file at `<root>/<step>/<path>` whose content is the
//! value. Files are created with create-new semantics, so a persisted entry is
//! never overwritten.

use async_trait::async_trait;
use pipeconf_core::{EnvironmentKey, SharedEnvironment};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::{error::RepositoryError, traits::EnvironmentStore, RepositoryResult};

/// File-backed shared environment
#[derive(Debug, Clone)]
pub struct FileEnvironmentStore {
    root: PathBuf,
}

impl FileEnvironmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the entry, after checking that it stays below the root
    pub fn entry_path(&self, step: &str, path: &str) -> RepositoryResult<PathBuf> {
        let invalid = || RepositoryError::InvalidEnvironmentPath {
            step: step.to_string(),
            path: path.to_string(),
        };

        if !is_plain_segment(step) {
            return Err(invalid());
        }
        let mut file = self.root.join(step);
        for segment in path.split('/') {
            if !is_plain_segment(segment) {
                return Err(invalid());
            }
            file.push(segment);
        }
        Ok(file)
    }

    /// Collect `(path, file)` pairs below one step directory
    async fn collect_files(
        dir: &Path,
        prefix: &str,
        out: &mut Vec<(String, PathBuf)>,
    ) -> RepositoryResult<()> {
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                warn!(path = %entry.path().display(), "Skipping non UTF-8 environment path");
                continue;
            };
            let path = if prefix.is_empty() {
                name
            } else {
                format!("{}/{}", prefix, name)
            };

            if entry.file_type().await?.is_dir() {
                Box::pin(Self::collect_files(&entry.path(), &path, out)).await?;
            } else {
                out.push((path, entry.path()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EnvironmentStore for FileEnvironmentStore {
    async fn load(&self) -> RepositoryResult<SharedEnvironment> {
        if !fs::try_exists(&self.root).await? {
            debug!(root = %self.root.display(), "No persisted environment");
            return Ok(SharedEnvironment::new());
        }

        let mut loaded = Vec::new();
        let mut steps = fs::read_dir(&self.root).await?;
        while let Some(step_dir) = steps.next_entry().await? {
            // Plain files at the root (e.g. config.yml) are not entries
            if !step_dir.file_type().await?.is_dir() {
                continue;
            }
            let Ok(step) = step_dir.file_name().into_string() else {
                continue;
            };

            let mut files = Vec::new();
            Self::collect_files(&step_dir.path(), "", &mut files).await?;
            for (path, file) in files {
                match fs::read_to_string(&file).await {
                    Ok(value) => loaded.push((EnvironmentKey::new(step.clone(), path), value)),
                    Err(e) if e.kind() == ErrorKind::InvalidData => {
                        warn!(path = %file.display(), "Skipping non UTF-8 environment value");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        debug!(root = %self.root.display(), entries = loaded.len(), "Loaded persisted environment");
        Ok(SharedEnvironment::from_entries(loaded))
    }

    async fn persist(&self, step: &str, path: &str, value: &str) -> RepositoryResult<()> {
        let file_path = self.entry_path(step, path)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let opened = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await;
        let mut file = match opened {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(RepositoryError::AlreadyRecorded {
                    step: step.to_string(),
                    path: path.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let written = match file.write_all(value.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // A truncated file would otherwise load as a recorded value
            drop(file);
            if let Err(remove) = fs::remove_file(&file_path).await {
                warn!(
                    path = %file_path.display(),
                    error = %remove,
                    "Could not remove partial environment entry"
                );
            }
            return Err(e.into());
        }

        debug!(step = %step, path = %path, "Persisted environment entry");
        Ok(())
    }

    async fn discard(&self, step: &str, path: &str) -> RepositoryResult<()> {
        let file_path = self.entry_path(step, path)?;
        match fs::remove_file(&file_path).await {
            Ok(()) => {
                debug!(step = %step, path = %path, "Discarded environment entry");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_path() {
        let store = FileEnvironmentStore::new("/env");
        assert_eq!(
            store.entry_path("commonPipelineEnvironment", "github/owner").unwrap(),
            PathBuf::from("/env/commonPipelineEnvironment/github/owner")
        );
    }

    #[test]
    fn test_entry_path_rejects_escapes() {
        let store = FileEnvironmentStore::new("/env");
        let escapes = [("..", "x"), ("step", "../x"), ("step", "a//b"), ("", "x"), ("a/b", "x")];
        for (step, path) in escapes {
            assert!(
                matches!(
                    store.entry_path(step, path),
                    Err(RepositoryError::InvalidEnvironmentPath { .. })
                ),
                "{}/{}",
                step,
                path
            );
        }
    }
}
