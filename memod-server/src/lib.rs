//! memod-server: memo sharing over HTTP
//!
//! Authenticated users post text memos, mark them public or private, and
//! browse paginated timelines of public memos. Every request follows the
//! same pipeline: load session, acquire one pooled connection, resolve the
//! caller's identity, run the route's repository calls, release the
//! connection, hand the results to the view layer.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use http::{build_router, run_server, HttpSettings};
pub use state::AppState;
