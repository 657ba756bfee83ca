//! Server configuration
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file) yields a runnable local setup. The CLI applies flag and
//! environment overrides on top.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::db::DEFAULT_POOL_SIZE;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("pool_size must be at least 1")]
    EmptyPool,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:5000)
    pub bind_addr: SocketAddr,

    /// SQLite database URL
    pub database_url: String,

    /// Number of pooled connections, fixed for the process lifetime
    pub pool_size: usize,

    /// Give up waiting for a pooled connection after this many seconds.
    /// Unset means wait forever.
    pub acquire_timeout_secs: Option<u64>,

    /// Secret the session cookie signing key is derived from. A random one
    /// is generated at start-up when unset (sessions then die with the
    /// process).
    pub session_secret: Option<String>,

    /// Directory for session records. Unset keeps sessions in memory.
    pub session_dir: Option<PathBuf>,

    /// Mark the session cookie `Secure` (HTTPS deployments)
    pub secure_cookies: bool,

    /// Directory served for paths no route matches
    pub public_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database_url: "sqlite://memo.db".to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            acquire_timeout_secs: None,
            session_secret: None,
            session_dir: None,
            secure_cookies: false,
            public_dir: PathBuf::from("public"),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("loading config file: {}", path.display());

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        Ok(())
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.pool_size, 10);
        assert!(config.acquire_timeout().is_none());
        assert!(!config.secure_cookies);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("memod.toml");
        std::fs::write(
            &path,
            r#"
            database_url = "sqlite:///var/lib/memod/memo.db"
            pool_size = 4
            acquire_timeout_secs = 3
            "#,
        )
        .unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.database_url, "sqlite:///var/lib/memod/memo.db");
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.acquire_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(config.bind_addr.port(), 5000);
    }

    #[test]
    fn zero_pool_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("memod.toml");
        std::fs::write(&path, "pool_size = 0").unwrap();

        let err = ServerConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPool));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ServerConfig::from_file(Path::new("/nonexistent/memod.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
