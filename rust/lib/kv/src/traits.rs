use crate::error::KVError;

/// KVStore provides a small key-value storage interface.
///
/// Keys follow a `/`-separated namespace convention, e.g. `claims/seq/20241210`.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Atomically add `by` to the u64 counter at `key` (missing = 0) and
    /// return the new value.
    fn increment(&self, key: &str, by: u64) -> Result<u64, KVError>;
}
