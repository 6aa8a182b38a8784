//! Key-value persistence backends.
//!
//! The simulation only defines the shape of what it persists; where the
//! bytes go is up to the host. `MemoryStore` serves tests and embedding,
//! `JsonFileStore` keeps one `<key>.json` file per key under a directory.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::PersistError;

pub trait StateStore {
    /// Stored value, or `None` when missing or unreadable
    fn load(&self, key: &str) -> Option<String>;

    fn save(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored state");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read stored state");
                None
            }
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.load("k").is_none());
        store.save("k", "v1").unwrap();
        store.save("k", "v2").unwrap();
        assert_eq!(store.load("k").as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("saves"));
        assert!(store.load("dungeonEcosystem").is_none());
        store.save("dungeonEcosystem", "{\"a\":1}").unwrap();
        assert_eq!(store.load("dungeonEcosystem").as_deref(), Some("{\"a\":1}"));
        assert!(dir.path().join("saves/dungeonEcosystem.json").exists());
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        store.save("../escape", "x").unwrap();
        assert!(dir.path().join("___escape.json").exists());
    }
}
