//! Schema creation command

use anyhow::{Context, Result};
use clap::Parser;

use memod_server::db::open_pool;
use memod_server::ServerConfig;

use super::DbArgs;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub db: DbArgs,
}

/// Create the schema. Safe to run against an existing database.
pub async fn run_migrate(mut config: ServerConfig, args: MigrateArgs) -> Result<()> {
    args.db.apply(&mut config);

    open_pool(&config.database_url, 1, None)
        .await
        .with_context(|| format!("Failed to migrate {}", config.database_url))?;

    tracing::info!(database_url = %config.database_url, "schema is up to date");
    Ok(())
}
