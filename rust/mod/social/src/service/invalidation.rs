//! Feed invalidation: a one-way signal to the presentation layer that a
//! cached view is stale.

use std::sync::Arc;

use tracing::debug;

use murmur_kv::KVStore;
use murmur_kv::traits::decode_counter;

use crate::service::SocialError;

/// Receives "this view changed" signals after mutations.
pub trait FeedInvalidator: Send + Sync {
    /// Mark the view at `path` stale.
    fn invalidate(&self, path: &str) -> Result<(), SocialError>;

    /// Current revision of the view at `path`; 0 if it never changed.
    fn revision(&self, path: &str) -> Result<u64, SocialError>;
}

/// Keeps a monotonically increasing revision per view path in the KV store.
pub struct KvFeedInvalidator {
    kv: Arc<dyn KVStore>,
}

impl KvFeedInvalidator {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    fn key(path: &str) -> String {
        format!("feed:revision:{}", path)
    }
}

impl FeedInvalidator for KvFeedInvalidator {
    fn invalidate(&self, path: &str) -> Result<(), SocialError> {
        let key = Self::key(path);
        let rev = self
            .kv
            .incr(&key, 1)
            .map_err(|e| SocialError::Storage(e.to_string()))?;
        debug!(path, rev, "feed invalidated");
        Ok(())
    }

    fn revision(&self, path: &str) -> Result<u64, SocialError> {
        let key = Self::key(path);
        match self.kv.get(&key) {
            Ok(Some(bytes)) => {
                decode_counter(&key, &bytes).map_err(|e| SocialError::Internal(e.to_string()))
            }
            Ok(None) => Ok(0),
            Err(e) => Err(SocialError::Storage(e.to_string())),
        }
    }
}
