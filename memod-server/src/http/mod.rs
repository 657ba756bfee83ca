//! HTTP layer
//!
//! Axum server with:
//! - Signed session cookies (tower-sessions)
//! - Request tracing
//! - Graceful shutdown
//! - Static files for any path no route claims

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;
pub mod views;

pub use error::ApiError;
pub use server::{build_router, run_server, HttpSettings};
