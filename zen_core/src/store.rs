//! Key-value storage for persisted progress.
//!
//! Progress is kept under plain string keys with string values. The
//! [`KeyValueStore`] trait is the only thing the ledger depends on; this
//! module provides an in-memory store and a JSON file store with file
//! locking.

use crate::{Error, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Synchronous string key-value storage
pub trait KeyValueStore {
    /// Read a value. Returns `Ok(None)` for keys never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a single value
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Write several values. Implementations that can commit a batch
    /// atomically should override this.
    fn set_many(&mut self, entries: &[(String, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// In-memory store, used for tests and dry runs
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store holding a single JSON object of string values
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a file store for the given path. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file that writers lock for the whole load-merge-save of a batch
    ///
    /// The data file itself is replaced on every save, so it can't carry a
    /// lock across writers.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;
        Ok(lock)
    }

    /// Load all entries with shared locking
    ///
    /// Returns an empty map if the file doesn't exist.
    /// If the file is unreadable or corrupted, logs a warning and returns an empty map.
    fn load_entries(&self) -> BTreeMap<String, String> {
        let path = &self.path;
        if !path.exists() {
            tracing::debug!("No storage file at {:?}, starting empty", path);
            return BTreeMap::new();
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open storage file {:?}: {}. Using defaults.", path, e);
                return BTreeMap::new();
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock storage file {:?}: {}. Using defaults.", path, e);
            return BTreeMap::new();
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        let _ = file.unlock();
        if let Err(e) = read {
            tracing::warn!("Failed to read storage file {:?}: {}. Using defaults.", path, e);
            return BTreeMap::new();
        }

        if contents.trim().is_empty() {
            return BTreeMap::new();
        }

        match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to parse storage file {:?}: {}. Using defaults.", path, e);
                BTreeMap::new()
            }
        }
    }

    /// Save all entries. Callers hold the write lock.
    ///
    /// Writes to a temp file in the same directory, syncs it, then renames
    /// it over the original so readers never see a partial file.
    fn save_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Storage(format!("storage path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(entries)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} storage entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load_entries().remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key.to_string(), value.to_string())])
    }

    fn set_many(&mut self, entries: &[(String, String)]) -> Result<()> {
        let lock = self.acquire_write_lock()?;

        let mut current = self.load_entries();
        for (key, value) in entries {
            current.insert(key.clone(), value.clone());
        }
        let saved = self.save_entries(&current);

        let _ = lock.unlock();
        saved
    }
}
