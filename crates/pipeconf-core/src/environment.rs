//! Shared pipeline environment record
//!
//! Process-wide, append-only store of values recorded by completed steps and
//! consumed by later steps through resource references. Readers work on an
//! immutable [`EnvironmentSnapshot`] taken when their resolution starts, so a
//! write that happens afterwards is never visible to them.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Key of a shared environment entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnvironmentKey {
    /// Producing step or named resource
    pub step: String,
    pub path: String,
}

impl EnvironmentKey {
    pub fn new(step: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            path: path.into(),
        }
    }
}

/// A recorded value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    pub value: String,
    pub recorded_at: DateTime<Utc>,
}

type EntryMap = BTreeMap<EnvironmentKey, EnvironmentEntry>;

/// Append-only, first-write-wins store shared across step invocations
#[derive(Debug, Default)]
pub struct SharedEnvironment {
    entries: RwLock<Arc<EntryMap>>,
}

impl SharedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record from previously persisted entries.
    /// When a key repeats, the first occurrence is kept.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (EnvironmentKey, String)>,
    {
        let now = Utc::now();
        let mut map = EntryMap::new();
        for (key, value) in entries {
            map.entry(key).or_insert_with(|| EnvironmentEntry {
                value,
                recorded_at: now,
            });
        }
        Self {
            entries: RwLock::new(Arc::new(map)),
        }
    }

    /// Record a value. Fails with `AlreadyRecorded` when the key exists; the
    /// existing value is left untouched.
    pub fn record(
        &self,
        step: impl Into<String>,
        path: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.record_all([(EnvironmentKey::new(step, path), value.into())])
    }

    /// Record several values at once, or none of them.
    ///
    /// Fails with `AlreadyRecorded` when a key exists or repeats in `entries`.
    pub fn record_all<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (EnvironmentKey, String)>,
    {
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());

        let mut batch = EntryMap::new();
        let now = Utc::now();
        for (key, value) in entries {
            if guard.contains_key(&key) || batch.contains_key(&key) {
                return Err(CoreError::AlreadyRecorded {
                    step: key.step,
                    path: key.path,
                });
            }
            batch.insert(
                key,
                EnvironmentEntry {
                    value,
                    recorded_at: now,
                },
            );
        }

        // Copy-on-write: outstanding snapshots keep the previous map
        Arc::make_mut(&mut *guard).extend(batch);
        Ok(())
    }

    /// Take an immutable view of the current entries
    pub fn snapshot(&self) -> EnvironmentSnapshot {
        let guard = self.entries.read().unwrap_or_else(|e| e.into_inner());
        EnvironmentSnapshot {
            entries: Arc::clone(&guard),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable view of the shared environment at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    entries: Arc<EntryMap>,
}

impl EnvironmentSnapshot {
    /// Look up the value recorded for `step` at `path`
    pub fn get(&self, step: &str, path: &str) -> Option<&str> {
        self.entries
            .get(&EnvironmentKey::new(step, path))
            .map(|e| e.value.as_str())
    }

    pub fn entry(&self, key: &EnvironmentKey) -> Option<&EnvironmentEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EnvironmentKey, &EnvironmentEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_record_and_read() {
        let env = SharedEnvironment::new();
        env.record("commonPipelineEnvironment", "github/owner", "SAP")
            .unwrap();

        let snapshot = env.snapshot();
        assert_eq!(
            snapshot.get("commonPipelineEnvironment", "github/owner"),
            Some("SAP")
        );
        assert_eq!(snapshot.get("commonPipelineEnvironment", "github/repo"), None);
    }

    #[test]
    fn test_first_write_wins() {
        let env = SharedEnvironment::new();
        env.record("build", "artifactVersion", "1.0.0").unwrap();

        let err = env.record("build", "artifactVersion", "2.0.0").unwrap_err();
        assert_eq!(
            err,
            CoreError::AlreadyRecorded {
                step: "build".to_string(),
                path: "artifactVersion".to_string(),
            }
        );
        assert_eq!(env.snapshot().get("build", "artifactVersion"), Some("1.0.0"));
    }

    #[test]
    fn test_snapshot_isolated_from_later_writes() {
        let env = SharedEnvironment::new();
        env.record("a", "x", "1").unwrap();

        let before = env.snapshot();
        env.record("b", "y", "2").unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(before.get("b", "y"), None);
        assert_eq!(env.snapshot().get("b", "y"), Some("2"));
    }

    #[test]
    fn test_from_entries_keeps_first() {
        let env = SharedEnvironment::from_entries(vec![
            (EnvironmentKey::new("a", "x"), "first".to_string()),
            (EnvironmentKey::new("a", "x"), "second".to_string()),
        ]);
        assert_eq!(env.snapshot().get("a", "x"), Some("first"));
    }

    #[test]
    fn test_record_all_is_all_or_nothing() {
        let env = SharedEnvironment::new();
        env.record("commonPipelineEnvironment", "github/owner", "SAP").unwrap();

        let err = env
            .record_all([
                (EnvironmentKey::new("setup", "marker"), "written".to_string()),
                (
                    EnvironmentKey::new("commonPipelineEnvironment", "github/owner"),
                    "other".to_string(),
                ),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::AlreadyRecorded { ref path, .. } if path == "github/owner"
        ));
        assert_eq!(env.snapshot().get("setup", "marker"), None);
        assert_eq!(env.len(), 1);

        let err = env
            .record_all([
                (EnvironmentKey::new("setup", "marker"), "a".to_string()),
                (EnvironmentKey::new("setup", "marker"), "b".to_string()),
            ])
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyRecorded { .. }));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_concurrent_writers_distinct_paths() {
        let env = Arc::new(SharedEnvironment::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let env = Arc::clone(&env);
                thread::spawn(move || env.record("stage", format!("p{}", i), i.to_string()))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(env.len(), 8);
    }
}
