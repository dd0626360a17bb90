//! Server-side configuration, read from a TOML file.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/murmur"
//! busy_timeout_ms = 5000
//!
//! [identity]
//! secret = "shared-hs256-secret"
//! issuer = "https://id.example.com"
//!
//! [feed]
//! suggestion_limit = 3
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory searched for bare context names.
const CONFIG_DIR: &str = "/etc/murmur";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,

    /// How long a writer waits for the SQLite lock before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Identity provider token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// HS256 secret shared with the identity provider.
    pub secret: String,

    /// Expected `iss` claim. Not checked when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: default_suggestion_limit(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_suggestion_limit() -> usize {
    3
}

fn default_max_content_chars() -> usize {
    2000
}

impl ServerConfig {
    /// Resolve `-c` to a file: names containing `/` or `.` are paths,
    /// anything else is `/etc/murmur/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            ServerConfig::resolve_path("dev"),
            PathBuf::from("/etc/murmur/dev.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("/srv/murmur/prod"),
            PathBuf::from("/srv/murmur/prod")
        );
    }

    #[test]
    fn test_load_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.toml");
        std::fs::write(
            &path,
            "[storage]\ndata_dir = \"/tmp/murmur\"\n\n[identity]\nsecret = \"s3cret\"\n",
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.storage.data_dir, "/tmp/murmur");
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.identity.secret, "s3cret");
        assert!(config.identity.issuer.is_none());
        assert_eq!(config.feed.suggestion_limit, 3);
        assert_eq!(config.feed.max_content_chars, 2000);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ServerConfig::load(Path::new("/nonexistent/murmur.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
