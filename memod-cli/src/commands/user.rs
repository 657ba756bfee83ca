//! User account commands

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use memod_server::db::{open_pool, UserRepo};
use memod_server::models::Username;
use memod_server::ServerConfig;

use super::DbArgs;

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a user with a salted password hash
    Add(AddUserArgs),
}

#[derive(Parser, Debug)]
pub struct AddUserArgs {
    /// Login name (no whitespace, at most 64 characters)
    pub username: String,

    /// Password
    #[arg(long, env = "MEMOD_USER_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[command(flatten)]
    pub db: DbArgs,
}

pub async fn run_user(config: ServerConfig, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Add(args) => add_user(config, args).await,
    }
}

async fn add_user(mut config: ServerConfig, args: AddUserArgs) -> Result<()> {
    args.db.apply(&mut config);
    let username = Username::new(&args.username).context("Invalid username")?;

    let pool = open_pool(&config.database_url, 1, None)
        .await
        .with_context(|| format!("Failed to open {}", config.database_url))?;
    let mut conn = pool.acquire().await?;

    let id = UserRepo::new(&mut conn)
        .create(&username, &args.password)
        .await
        .with_context(|| format!("Failed to create user '{}'", username.as_str()))?;

    tracing::info!(user_id = id, username = username.as_str(), "user created");
    println!("Created user {} (id {})", username.as_str(), id);
    Ok(())
}
