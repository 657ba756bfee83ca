//! Command implementations for memod CLI

pub mod migrate;
pub mod serve;
pub mod user;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use memod_server::ServerConfig;

// Re-export dispatcher functions for flat access from main.rs
pub use migrate::{run_migrate, MigrateArgs};
pub use serve::{run_serve, ServeArgs};
pub use user::{run_user, UserCommands};

/// Read `path` when given, else start from defaults.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

/// Database location shared by every command that opens the database
#[derive(Args, Debug, Default)]
pub struct DbArgs {
    /// SQLite database URL (overrides config)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

impl DbArgs {
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
    }
}
