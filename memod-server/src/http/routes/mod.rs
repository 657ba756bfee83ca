//! Route modules
//!
//! Every handler follows the same pipeline: load session, acquire one pooled
//! connection, resolve identity, run the repository calls, release the
//! connection, hand a view to [`super::views`].

pub mod auth;
pub mod feed;
pub mod memos;
