//! Database layer - connection pool, schema and repositories
//!
//! Every repository borrows a single checked-out connection, so the queries
//! of one request run sequentially on one handle and a request never holds
//! more than one handle.

pub mod pool;
pub mod repos;
pub mod schema;

use std::time::Duration;

use sqlx::SqliteConnection;

pub use pool::{sqlite_options, ConnectionPool, PoolError, PooledConnection, DEFAULT_POOL_SIZE};
pub use repos::*;

/// The pool type the server runs on.
pub type DbPool = ConnectionPool<SqliteConnection>;

/// Open a pool of `size` connections to `database_url` and make sure the
/// schema exists.
pub async fn open_pool(
    database_url: &str,
    size: usize,
    acquire_timeout: Option<Duration>,
) -> crate::Result<DbPool> {
    let options = sqlite_options(database_url)?;
    let pool = ConnectionPool::connect_sqlite(&options, size, acquire_timeout).await?;

    let mut conn = pool.acquire().await?;
    schema::migrate(&mut conn).await?;

    Ok(pool)
}
