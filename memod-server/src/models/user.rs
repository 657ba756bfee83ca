//! Users, credentials and the identity carried in a session

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::FromRow;

use super::ValidationError;

const MAX_USERNAME_LEN: usize = 64;
const SALT_LEN: usize = 16;

/// Full user row, credentials included. Never leaves the repository layer.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Hex SHA-256 of `salt + password`.
    pub password: String,
    pub salt: String,
    pub last_access: Option<DateTime<Utc>>,
}

impl User {
    /// Compare the salted hash of `password` with the stored one.
    pub fn verify_password(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.password
    }

    pub fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Identity of a signed-in caller, as stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
}

/// Hex-encoded SHA-256 of `salt` followed by `password`.
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Random alphanumeric salt for a new user.
pub fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

/// Validated username: non-empty, at most 64 characters, no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }

        if s.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN,
            });
        }

        if s.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "must not contain whitespace",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
