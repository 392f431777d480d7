use crate::error::StoreResult;

/// Integer-valued key-value store.
///
/// All implementations must satisfy these invariants:
/// - Read-after-write: a successful `put_int` or `remove` is visible to
///   every subsequent call, from any thread.
/// - Keys are opaque strings; the store applies no namespacing of its own.
/// - All I/O errors are propagated, never silently ignored.
pub trait ValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent.
    fn get_int(&self, key: &str) -> StoreResult<Option<i64>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put_int(&self, key: &str, value: i64) -> StoreResult<()>;

    /// Remove `key`. Returns `true` if it was present.
    fn remove(&self, key: &str) -> StoreResult<bool>;

    /// All keys currently present, sorted.
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Check whether `key` is present.
    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get_int(key)?.is_some())
    }

    /// Remove several keys as one operation.
    ///
    /// Default implementation calls `remove()` for each key. Backends may
    /// override to persist once. Returns the number of keys that existed.
    fn remove_batch(&self, keys: &[String]) -> StoreResult<usize> {
        let mut removed = 0;
        for key in keys {
            if self.remove(key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
