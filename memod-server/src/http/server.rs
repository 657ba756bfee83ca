//! Axum server setup
//!
//! Server skeleton with:
//! - Signed `memo_session` cookie, pluggable session store
//! - Tracing middleware
//! - Static file fallback
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions::{MemoryStore, SessionManagerLayer, SessionStore};

use super::routes;
use crate::config::ServerConfig;
use crate::db::open_pool;
use crate::session::{generate_token, signing_key, FileStore, SESSION_COOKIE};
use crate::state::AppState;

/// How often expired session files are swept.
const EXPIRED_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Router settings that do not live in [`AppState`].
#[derive(Clone)]
pub struct HttpSettings {
    /// Key the session cookie is signed with
    pub signing_key: Key,

    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,

    /// Directory served for any path no route matches
    pub public_dir: PathBuf,
}

impl HttpSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        let secret = match &config.session_secret {
            Some(secret) => secret.clone(),
            None => {
                tracing::warn!("session_secret not set; sessions will not survive a restart");
                generate_token()
            }
        };

        Self {
            signing_key: signing_key(&secret),
            secure_cookies: config.secure_cookies,
            public_dir: config.public_dir.clone(),
        }
    }
}

/// Build the application router on top of `store`.
pub fn build_router<S>(state: AppState, store: S, settings: HttpSettings) -> Router
where
    S: SessionStore + Clone,
{
    let sessions = SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_secure(settings.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_signed(settings.signing_key);

    Router::new()
        .merge(routes::feed::router())
        .merge(routes::auth::router())
        .merge(routes::memos::router())
        .fallback_service(ServeDir::new(settings.public_dir))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let config = ServerConfig::from_file(Path::new("memod.toml"))?;
/// run_server(config).await?;
/// ```
pub async fn run_server(config: ServerConfig) -> crate::Result<()> {
    config.validate()?;

    let pool = open_pool(&config.database_url, config.pool_size, config.acquire_timeout()).await?;
    tracing::info!(
        database_url = %config.database_url,
        pool_size = pool.capacity(),
        "database ready"
    );
    let state = AppState::new(pool.clone());
    let settings = HttpSettings::from_config(&config);

    let mut sweeper = None;
    let app = match &config.session_dir {
        Some(dir) => {
            tracing::info!(session_dir = %dir.display(), "using file session store");
            let store = FileStore::new(dir.clone());
            sweeper = Some(spawn_expired_sweep(store.clone()));
            build_router(state, store, settings)
        }
        None => {
            tracing::info!("using in-memory session store");
            build_router(state, MemoryStore::default(), settings)
        }
    };

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    pool.close();

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Remove expired session files in the background until aborted.
fn spawn_expired_sweep(store: FileStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EXPIRED_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = store.delete_expired().await {
                tracing::warn!("expired session sweep failed: {e}");
            }
        }
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}
