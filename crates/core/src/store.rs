//! Key-value persistence for the data aggregate.

use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tempfile::NamedTempFile;

use crate::models::DataAggregate;

/// Store consumed by the round manager.
///
/// `save` is last-write-wins; callers treat failures as best-effort.
pub trait KeyValueStore {
    /// Read the aggregate stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<DataAggregate>>;
    /// Replace whatever is stored under `key`.
    fn save(&self, key: &str, data: &DataAggregate) -> Result<()>;
}

/// One pretty-printed JSON document per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the documents live in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_component(key)))
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<DataAggregate>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let data = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(data))
    }

    fn save(&self, key: &str, data: &DataAggregate) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        let path = self.path_for(key);
        let serialised = serde_json::to_vec_pretty(data)?;
        let mut staged = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("failed to stage {}", path.display()))?;
        staged
            .write_all(&serialised)
            .with_context(|| format!("failed to write {}", path.display()))?;
        staged
            .persist(&path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// In-memory store shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, DataAggregate>,
    saves: usize,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key before handing the store to a manager.
    pub fn with_entry(self, key: &str, data: DataAggregate) -> Self {
        self.inner.write().entries.insert(key.to_string(), data);
        self
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.inner.read().saves
    }

    /// Copy of the aggregate under `key`.
    pub fn snapshot(&self, key: &str) -> Option<DataAggregate> {
        self.inner.read().entries.get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<DataAggregate>> {
        Ok(self.snapshot(key))
    }

    fn save(&self, key: &str, data: &DataAggregate) -> Result<()> {
        let mut inner = self.inner.write();
        inner.entries.insert(key.to_string(), data.clone());
        inner.saves += 1;
        Ok(())
    }
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "data".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::sample_course, models::Round};
    use tempfile::tempdir;

    fn sample_data() -> DataAggregate {
        let course = sample_course();
        let round = Round::new(&course);
        let mut data = DataAggregate {
            courses: vec![course],
            current_round: Some(round),
            ..DataAggregate::default()
        };
        data.settings.set_handicap(Some(14));
        data
    }

    #[test]
    fn file_store_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().join("nested"));
        assert!(store.load("golfData")?.is_none());

        let data = sample_data();
        store.save("golfData", &data)?;
        assert!(store.path_for("golfData").exists());
        assert_eq!(store.load("golfData")?, Some(data.clone()));

        let mut updated = data;
        updated.current_round = None;
        store.save("golfData", &updated)?;
        assert_eq!(store.load("golfData")?, Some(updated));
        Ok(())
    }

    #[test]
    fn corrupt_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path_for("golfData"), "{ not json")?;
        assert!(store.load("golfData").is_err());
        Ok(())
    }

    #[test]
    fn memory_store_is_shared_between_clones() -> Result<()> {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save("golfData", &sample_data())?;
        assert_eq!(handle.save_count(), 1);
        assert!(handle.load("golfData")?.is_some());
        assert!(handle.load("other")?.is_none());
        Ok(())
    }

    #[test]
    fn sanitize_creates_safe_filenames() {
        assert_eq!(sanitize_component("golf Data!*"), "golfData");
        assert_eq!(sanitize_component("../"), "data");
    }
}
