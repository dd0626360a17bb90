use crate::error::KVError;

/// KVStore provides a key-value storage interface.
///
/// Keys follow a namespaced convention: `feed:revision:/`,
/// `feed:revision:/profile/alice`, etc.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Atomically add `delta` to the big-endian u64 counter stored at `key`
    /// (missing keys count as 0) and return the new value.
    fn incr(&self, key: &str, delta: u64) -> Result<u64, KVError>;
}

/// Decode a counter value written by [`KVStore::incr`].
pub fn decode_counter(key: &str, bytes: &[u8]) -> Result<u64, KVError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| KVError::Serialization(format!("{key}: not a u64 counter")))?;
    Ok(u64::from_be_bytes(raw))
}
