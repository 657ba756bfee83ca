//! memod CLI - memo sharing server
//!
//! Entry point for the memod server:
//! - `serve`: run the HTTP server
//! - `migrate`: create the database schema
//! - `user add`: seed an account (there is no sign-up route)

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{MigrateArgs, ServeArgs, UserCommands};

#[derive(Parser, Debug)]
#[command(
    name = "memod",
    author,
    version,
    about = "Share short text memos over HTTP",
    long_about = "Authenticated users post text memos, mark them public or private, and \
                  browse paginated timelines of public memos."
)]
struct Cli {
    /// TOML config file; every field is optional
    #[arg(long, short = 'c', global = true, env = "MEMOD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),

    /// Create the database schema (idempotent)
    Migrate(MigrateArgs),

    /// Manage user accounts
    #[command(subcommand)]
    User(UserCommands),
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing().ok();
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(config, args).await?,
        Commands::Migrate(args) => commands::run_migrate(config, args).await?,
        Commands::User(cmd) => commands::run_user(config, cmd).await?,
    }

    Ok(())
}
