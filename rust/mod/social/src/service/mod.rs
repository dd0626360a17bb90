pub mod content;
pub mod feed;
pub mod graph;
pub mod identity;
pub mod invalidation;
pub mod notification;
pub mod reaction;
pub mod records;
pub mod schema;

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};

use murmur_kv::KVStore;
use murmur_sql::{SQLError, SQLStore, Transaction};

use crate::model::Actor;
use crate::service::invalidation::{FeedInvalidator, KvFeedInvalidator};

/// Social engine error type.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The actor may not touch the resource (e.g. deleting another user's post).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Liking your own post, following yourself.
    #[error("self action forbidden: {0}")]
    SelfActionForbidden(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

/// Every SQL failure that reaches a caller is a storage failure, constraint
/// violations included. Toggles and first-contact sync handle key
/// collisions before they get this far.
impl From<SQLError> for SocialError {
    fn from(e: SQLError) -> Self {
        SocialError::Storage(e.to_string())
    }
}

impl From<SocialError> for murmur_core::ServiceError {
    fn from(e: SocialError) -> Self {
        use murmur_core::ServiceError;

        match e {
            SocialError::NotFound(m) => ServiceError::NotFound(m),
            SocialError::Unauthorized(m) => ServiceError::PermissionDenied(m),
            SocialError::SelfActionForbidden(m) => ServiceError::SelfActionForbidden(m),
            SocialError::Validation(m) => ServiceError::Validation(m),
            SocialError::Unauthenticated(m) => ServiceError::Unauthenticated(m),
            // Storage detail stays in the log.
            SocialError::Storage(m) => {
                error!("storage failure: {m}");
                ServiceError::Storage("storage failure".into())
            }
            SocialError::Internal(m) => {
                error!("internal failure: {m}");
                ServiceError::Internal("internal failure".into())
            }
        }
    }
}

/// Configuration for the social engine.
#[derive(Debug, Clone)]
pub struct SocialConfig {
    /// Maximum number of follow suggestions returned (default: 3).
    pub suggestion_limit: usize,
    /// Maximum post/comment length in characters (default: 2000).
    pub max_content_chars: usize,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: 3,
            max_content_chars: 2000,
        }
    }
}

/// The social engine. Holds the storage handles and configuration.
///
/// Constructed once at startup and shared across requests.
pub struct SocialService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) invalidator: Arc<dyn FeedInvalidator>,
    pub(crate) config: SocialConfig,
}

impl SocialService {
    /// Create a new SocialService, initializing the DB schema.
    ///
    /// Feed revisions are kept in `kv`.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        kv: Arc<dyn KVStore>,
        config: SocialConfig,
    ) -> Result<Arc<Self>, SocialError> {
        Self::with_invalidator(sql, Arc::new(KvFeedInvalidator::new(kv)), config)
    }

    /// Create a SocialService that signals feed changes to a custom invalidator.
    pub fn with_invalidator(
        sql: Arc<dyn SQLStore>,
        invalidator: Arc<dyn FeedInvalidator>,
        config: SocialConfig,
    ) -> Result<Arc<Self>, SocialError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self {
            sql,
            invalidator,
            config,
        }))
    }

    /// Run `work` as one atomic unit: commit if it returns `Ok`, roll back
    /// every write it made otherwise.
    ///
    /// The closure must only use `tx` for storage access; the store's
    /// connection is held for the duration of the unit.
    pub(crate) fn unit_of_work<T>(
        &self,
        work: impl FnOnce(&dyn Transaction) -> Result<T, SocialError>,
    ) -> Result<T, SocialError> {
        let tx = self.sql.begin()?;
        let out = work(tx.as_ref())?;
        tx.commit()?;
        Ok(out)
    }

    /// Signal the presentation layer that `path` changed. Never fails the caller.
    pub(crate) fn invalidate(&self, path: &str) {
        if let Err(e) = self.invalidator.invalidate(path) {
            warn!("feed invalidation for {path} failed: {e}");
        }
    }

    /// Current revision of a cached view.
    pub fn feed_revision(&self, path: &str) -> Result<u64, SocialError> {
        self.invalidator.revision(path)
    }
}

/// Require an authenticated actor for a mutation.
pub(crate) fn require_user(actor: &Actor) -> Result<&str, SocialError> {
    actor
        .id()
        .ok_or_else(|| SocialError::Unauthenticated("sign in required".into()))
}

/// Fail with `NotFound` unless `actor_id` names a stored user.
///
/// Runs inside the caller's unit of work so the actor cannot vanish
/// between the check and the writes that reference it.
pub(crate) fn require_stored_user(tx: &dyn Transaction, actor_id: &str) -> Result<(), SocialError> {
    if records::exists(
        tx,
        "SELECT 1 FROM users WHERE id = ?1",
        &[murmur_sql::Value::Text(actor_id.to_string())],
    )? {
        Ok(())
    } else {
        Err(SocialError::NotFound(format!("users/{}", actor_id)))
    }
}

/// Trim `content` and check it against the configured limits.
pub(crate) fn clean_content(
    content: &str,
    max_chars: usize,
    what: &str,
) -> Result<String, SocialError> {
    let trimmed = content.trim();
    if trimmed.chars().count() > max_chars {
        return Err(SocialError::Validation(format!(
            "{what} exceeds {max_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}
