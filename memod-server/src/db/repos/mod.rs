//! Repository implementations for database access
//!
//! Each repository borrows one pooled connection for its lifetime:
//! - Lists JOIN the owner username (no N+1)
//! - Unique violations surface as `DbError::Conflict` (no check-then-insert)
//! - No transaction spans more than one repository call

pub mod memos;
pub mod users;

pub use memos::MemoRepo;
pub use users::UserRepo;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("already exists: {resource} '{id}'")]
    Conflict { resource: &'static str, id: String },
}
