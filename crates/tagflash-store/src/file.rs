use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ValueStore;

/// Durable value store backed by a single JSON object file.
///
/// On-disk format:
/// ```text
/// { "config_value_FARM": 99, "config_value_SCHOOL": 3 }
/// ```
///
/// The whole map is held in memory. Every mutation writes the new map to a
/// temporary file in the same directory, syncs it and renames it over the
/// original, so a crash leaves either the old or the new file. The in-memory
/// map is only updated after the rename succeeds.
pub struct FileValueStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, i64>>,
}

impl FileValueStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file is treated as an empty store; it is created on the
    /// first mutation.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let values = match fs::read(path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), keys = values.len(), "opened value store");
        Ok(Self {
            path: path.to_path_buf(),
            values: Mutex::new(values),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, i64>) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let json = serde_json::to_vec_pretty(values).map_err(|e| StoreError::Serialization {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %self.path.display(), keys = values.len(), "value store persisted");
        Ok(())
    }

    /// Apply `mutate` to a copy of the map, persist it, then commit it.
    fn update<T>(&self, mutate: impl FnOnce(&mut BTreeMap<String, i64>) -> T) -> StoreResult<T> {
        let mut guard = self.values.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut next = guard.clone();
        let out = mutate(&mut next);
        if next != *guard {
            self.persist(&next)?;
            *guard = next;
        }
        Ok(out)
    }
}

impl ValueStore for FileValueStore {
    fn get_int(&self, key: &str) -> StoreResult<Option<i64>> {
        let map = self.values.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(key).copied())
    }

    fn put_int(&self, key: &str, value: i64) -> StoreResult<()> {
        self.update(|map| {
            map.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        self.update(|map| map.remove(key).is_some())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let map = self.values.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.keys().cloned().collect())
    }

    fn remove_batch(&self, keys: &[String]) -> StoreResult<usize> {
        self.update(|map| keys.iter().filter(|k| map.remove(*k).is_some()).count())
    }
}

impl std::fmt::Debug for FileValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileValueStore")
            .field("path", &self.path)
            .finish()
    }
}
