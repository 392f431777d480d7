use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::ValueStore;

/// In-memory, HashMap-based value store.
///
/// Intended for tests and embedding. Values live behind a `RwLock` and are
/// lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryValueStore {
    values: RwLock<HashMap<String, i64>>,
}

impl InMemoryValueStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ValueStore for InMemoryValueStore {
    fn get_int(&self, key: &str) -> StoreResult<Option<i64>> {
        let map = self.values.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(key).copied())
    }

    fn put_int(&self, key: &str, value: i64) -> StoreResult<()> {
        let mut map = self.values.write().map_err(|_| StoreError::LockPoisoned)?;
        map.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let mut map = self.values.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.remove(key).is_some())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let map = self.values.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
