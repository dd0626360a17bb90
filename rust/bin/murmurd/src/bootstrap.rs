//! Bootstrap: startup checks and storage initialization.
//!
//! When murmurd starts:
//! 1. Verify the config is usable; if not, refuse to start.
//! 2. Open the embedded stores shared by all modules.

use std::sync::Arc;
use std::time::Duration;

use murmur_core::ServiceConfig;
use murmur_kv::{KVStore, RedbStore};
use murmur_sql::{SQLStore, SqliteStore};
use tracing::info;

use crate::config::ServerConfig;

/// Verify server configuration is ready for use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.identity.secret.is_empty() {
        anyhow::bail!("identity secret is empty in configuration.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("storage data_dir is empty in configuration.");
    }
    if config.feed.suggestion_limit == 0 {
        anyhow::bail!("feed suggestion_limit must be at least 1.");
    }
    if config.feed.max_content_chars == 0 {
        anyhow::bail!("feed max_content_chars must be at least 1.");
    }
    Ok(())
}

/// Embedded stores, opened once per process.
pub struct Stores {
    pub sql: Arc<dyn SQLStore>,
    pub kv: Arc<dyn KVStore>,
}

/// Open the SQL and KV stores at the paths `service` resolves to.
pub fn open_stores(service: &ServiceConfig, config: &ServerConfig) -> anyhow::Result<Stores> {
    if let Some(dir) = &service.data_dir {
        std::fs::create_dir_all(dir)?;
    }

    let sqlite_path = service.resolve_sqlite_path();
    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open_with_timeout(
            &sqlite_path,
            Duration::from_millis(config.storage.busy_timeout_ms),
        )
        .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    info!("SQL store at {}", sqlite_path.display());

    let db_path = service.resolve_db_path();
    let kv: Arc<dyn KVStore> = Arc::new(
        RedbStore::open(&db_path).map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    info!("KV store at {}", db_path.display());

    Ok(Stores { sql, kv })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeedConfig, IdentityConfig, StorageConfig};

    fn config(data_dir: &str, secret: &str) -> ServerConfig {
        ServerConfig {
            storage: StorageConfig {
                data_dir: data_dir.to_string(),
                busy_timeout_ms: 1000,
            },
            identity: IdentityConfig {
                secret: secret.to_string(),
                issuer: None,
            },
            feed: FeedConfig::default(),
        }
    }

    #[test]
    fn test_verify_config() {
        assert!(verify_config(&config("/tmp", "s3cret")).is_ok());
        assert!(verify_config(&config("/tmp", "")).is_err());
        assert!(verify_config(&config("", "s3cret")).is_err());

        let mut zero = config("/tmp", "s3cret");
        zero.feed.suggestion_limit = 0;
        assert!(verify_config(&zero).is_err());
    }

    #[test]
    fn test_open_stores_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested/data");
        let service = ServiceConfig {
            data_dir: Some(data_dir.clone()),
            ..Default::default()
        };

        let stores = open_stores(&service, &config("unused", "s3cret")).unwrap();
        stores.kv.set("k", b"v").unwrap();
        assert!(data_dir.join("data.sqlite").exists());
        assert!(data_dir.join("data.redb").exists());
    }
}
