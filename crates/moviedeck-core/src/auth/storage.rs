//! Durable key-value storage for session values.
//!
//! Values are plain strings with no TTL and no encryption. Anything written
//! here is readable by whoever can read the storage file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};

/// Storage file name in the data directory
pub const STORAGE_FILE: &str = "storage.json";

pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Write several entries together. Backends that can commit them in one
    /// step override this.
    fn set_entries(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several keys together.
    fn remove_entries(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a valid map
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn set_entries(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut map = self.entries();
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// Storage persisted as a single JSON object on disk.
///
/// Every mutation rewrites the whole file through a temp file and a rename,
/// so a batch of entries lands together or not at all.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage file in `data_dir`, loading existing entries.
    pub fn open(data_dir: &Path) -> Result<Self> {
        Self::with_path(data_dir.join(STORAGE_FILE))
    }

    pub fn with_path(path: PathBuf) -> Result<Self> {
        let entries = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read storage file")?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).context("Failed to parse storage file")?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `change` to a copy of the entries and persist it; memory is only
    /// updated once the file write succeeded.
    fn commit<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries();
        let mut next = entries.clone();
        change(&mut next);
        self.write_file(&next)?;
        *entries = next;
        Ok(())
    }

    fn write_file(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).context("Failed to write storage file")?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace storage file")?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.commit(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.entries().contains_key(key) {
            return Ok(());
        }
        self.commit(|map| {
            map.remove(key);
        })
    }

    fn set_entries(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.commit(|map| {
            for (key, value) in entries {
                map.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn remove_entries(&self, keys: &[&str]) -> Result<()> {
        self.commit(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
    }
}
