//! Fixed-capacity connection pool
//!
//! Handles are opened once at start-up and circulate between request
//! handlers for the life of the process. `acquire` waits for a free handle;
//! dropping the returned [`PooledConnection`] puts the handle back, so every
//! exit path of a handler (success, early return, `?`, cancellation)
//! releases exactly once.
//!
//! Waiters are not served in any particular order. The only guarantees are
//! that a handle is never held by two callers at once and that no handle is
//! ever lost.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{ConnectOptions, SqliteConnection};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Number of handles opened when nothing else is configured.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// How long SQLite waits on a locked database before reporting `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("pool must hold at least one connection")]
    Empty,

    #[error("no connection became available within {0:?}")]
    Exhausted(Duration),

    #[error("connection pool is closed")]
    Closed,

    #[error("failed to open connection: {0}")]
    Connect(#[from] sqlx::Error),
}

/// Bounded set of reusable handles shared by all request handlers.
///
/// Cloning is cheap and every clone refers to the same handles.
pub struct ConnectionPool<C> {
    inner: Arc<PoolInner<C>>,
}

struct PoolInner<C> {
    /// Handles not currently checked out. Never holds fewer entries than
    /// there are free permits.
    idle: Mutex<Vec<C>>,
    permits: Arc<Semaphore>,
    capacity: usize,
    acquire_timeout: Option<Duration>,
}

impl<C> PoolInner<C> {
    fn idle(&self) -> MutexGuard<'_, Vec<C>> {
        // The lock is only held for a push or pop, so a poisoned guard still
        // holds a consistent Vec.
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> ConnectionPool<C> {
    /// Build a pool around already-open handles. `acquire` waits forever.
    pub fn new(handles: Vec<C>) -> Result<Self, PoolError> {
        Self::with_acquire_timeout(handles, None)
    }

    /// Build a pool whose `acquire` gives up after `timeout` when set.
    pub fn with_acquire_timeout(
        handles: Vec<C>,
        timeout: Option<Duration>,
    ) -> Result<Self, PoolError> {
        if handles.is_empty() {
            return Err(PoolError::Empty);
        }

        let capacity = handles.len();
        Ok(Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(handles),
                permits: Arc::new(Semaphore::new(capacity)),
                capacity,
                acquire_timeout: timeout,
            }),
        })
    }

    /// Check out a handle, waiting until one is free.
    pub async fn acquire(&self) -> Result<PooledConnection<C>, PoolError> {
        let permits = Arc::clone(&self.inner.permits);
        let permit = match self.inner.acquire_timeout {
            None => permits.acquire_owned().await.map_err(|_| PoolError::Closed)?,
            Some(limit) => tokio::time::timeout(limit, permits.acquire_owned())
                .await
                .map_err(|_| {
                    tracing::warn!(timeout = ?limit, "connection pool exhausted");
                    PoolError::Exhausted(limit)
                })?
                .map_err(|_| PoolError::Closed)?,
        };

        // Holding a permit means at least one handle is idle.
        let conn = self.inner.idle().pop().ok_or(PoolError::Closed)?;
        tracing::trace!(available = self.available(), "connection acquired");

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    /// Total number of handles, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Handles that can be acquired right now without waiting.
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Handles currently checked out.
    pub fn in_use(&self) -> usize {
        self.capacity() - self.available()
    }

    /// Stop handing out handles. Pending and later `acquire` calls fail with
    /// [`PoolError::Closed`]; handles already checked out still come back.
    pub fn close(&self) {
        self.inner.permits.close();
        tracing::debug!(in_use = self.in_use(), "connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.permits.is_closed()
    }
}

impl ConnectionPool<SqliteConnection> {
    /// Open `capacity` SQLite connections and pool them.
    pub async fn connect_sqlite(
        options: &SqliteConnectOptions,
        capacity: usize,
        acquire_timeout: Option<Duration>,
    ) -> Result<Self, PoolError> {
        if capacity == 0 {
            return Err(PoolError::Empty);
        }

        let mut handles = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            handles.push(options.connect().await?);
        }
        tracing::info!(capacity, "connection pool filled");

        Self::with_acquire_timeout(handles, acquire_timeout)
    }
}

impl<C> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .finish()
    }
}

/// A checked-out handle. Returned to the pool on drop.
pub struct PooledConnection<C> {
    conn: Option<C>,
    pool: Arc<PoolInner<C>>,
    // Released after `Drop::drop` has pushed the handle back.
    _permit: OwnedSemaphorePermit,
}

// `conn` is only taken in `Drop::drop`, so every other access sees `Some`.
impl<C> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.conn.as_ref().expect("connection is present until drop")
    }
}

impl<C> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut C {
        self.conn.as_mut().expect("connection is present until drop")
    }
}

impl<C> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.idle().push(conn);
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for PooledConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("conn", &self.conn)
            .finish()
    }
}

/// Connect options for a SQLite database URL (`sqlite://path/to/file.db`).
///
/// The file is created when missing; WAL mode lets readers proceed while a
/// writer holds the lock.
pub fn sqlite_options(database_url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT))
}
