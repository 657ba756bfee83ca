//! HTTP server command
//!
//! Flags and environment variables override the config file field by field.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use memod_server::{run_server, ServerConfig};

use super::DbArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 0.0.0.0:5000)
    #[arg(long, short = 'b', env = "MEMOD_BIND")]
    pub bind: Option<SocketAddr>,

    #[command(flatten)]
    pub db: DbArgs,

    /// Number of pooled database connections (default: 10)
    #[arg(long, env = "MEMOD_POOL_SIZE")]
    pub pool_size: Option<usize>,

    /// Fail a request after waiting this many seconds for a connection
    #[arg(long, env = "MEMOD_ACQUIRE_TIMEOUT")]
    pub acquire_timeout: Option<u64>,

    /// Secret the session cookie signing key is derived from
    #[arg(long, env = "MEMOD_SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Keep sessions as files in this directory instead of in memory
    #[arg(long, env = "MEMOD_SESSION_DIR")]
    pub session_dir: Option<PathBuf>,

    /// Mark the session cookie Secure (serve behind HTTPS)
    #[arg(long, env = "MEMOD_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Directory of static assets
    #[arg(long, env = "MEMOD_PUBLIC_DIR")]
    pub public_dir: Option<PathBuf>,
}

impl ServeArgs {
    /// Apply every flag that was given on top of `config`.
    pub fn apply(self, config: &mut ServerConfig) {
        self.db.apply(config);

        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(size) = self.pool_size {
            config.pool_size = size;
        }
        if let Some(secs) = self.acquire_timeout {
            config.acquire_timeout_secs = Some(secs);
        }
        if let Some(secret) = self.session_secret {
            config.session_secret = Some(secret);
        }
        if let Some(dir) = self.session_dir {
            config.session_dir = Some(dir);
        }
        if self.secure_cookies {
            config.secure_cookies = true;
        }
        if let Some(dir) = self.public_dir {
            config.public_dir = dir;
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(mut config: ServerConfig, args: ServeArgs) -> Result<()> {
    args.apply(&mut config);
    config.validate().context("Invalid server configuration")?;

    tracing::info!("Starting memod server on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(config).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = ServeArgs::try_parse_from([
            "serve",
            "--bind",
            "127.0.0.1:8080",
            "--database-url",
            "sqlite://flag.db",
            "--pool-size",
            "4",
            "--acquire-timeout",
            "3",
            "--session-dir",
            "/tmp/memod-sessions",
            "--secure-cookies",
        ])
        .unwrap();

        let mut config = ServerConfig::default();
        args.apply(&mut config);

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.database_url, "sqlite://flag.db");
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.acquire_timeout_secs, Some(3));
        assert_eq!(
            config.session_dir.as_deref(),
            Some(std::path::Path::new("/tmp/memod-sessions"))
        );
        assert!(config.secure_cookies);
    }

    #[test]
    fn rejects_unparseable_bind_address() {
        assert!(ServeArgs::try_parse_from(["serve", "--bind", "not-an-address"]).is_err());
    }
}
