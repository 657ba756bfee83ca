//! Domain models
//!
//! Memo visibility and sibling rules live here so every read path applies
//! the same policy.

pub mod memo;
pub mod pagination;
pub mod user;
pub mod validation;

pub use memo::{first_line, is_visible_to, siblings_of, Memo, Siblings};
pub use pagination::{PageRequest, Paginated, MEMOS_PER_PAGE};
pub use user::{generate_salt, hash_password, User, UserRef, Username};
pub use validation::ValidationError;
