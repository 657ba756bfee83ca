//! Session & identity resolution
//!
//! The caller's identity comes straight from session state (user id and
//! username written at sign-in); resolving it performs no I/O and never
//! touches the database. Storage of session records is delegated to any
//! `tower_sessions::SessionStore`, so tests run on the in-memory store and
//! deployments can use [`FileStore`].

pub mod csrf;
pub mod file_store;

use rand::Rng;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::Key;
use tower_sessions::session::Error as SessionError;
use tower_sessions::Session;

use crate::models::UserRef;

pub use csrf::{verify_csrf, CsrfError};
pub use file_store::FileStore;

/// Name of the browser cookie carrying the signed session id.
pub const SESSION_COOKIE: &str = "memo_session";

const USER_ID_KEY: &str = "user_id";
const USERNAME_KEY: &str = "username";
const TOKEN_KEY: &str = "token";

/// Values read from the session at the start of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    user_id: Option<i64>,
    username: Option<String>,
    token: Option<String>,
}

impl SessionState {
    /// Read the session record. Fails only when the backing store cannot
    /// produce or decode it.
    pub async fn load(session: &Session) -> Result<Self, SessionError> {
        Ok(Self {
            user_id: session.get(USER_ID_KEY).await?,
            username: session.get(USERNAME_KEY).await?,
            token: session.get(TOKEN_KEY).await?,
        })
    }

    /// The signed-in user, or `None` for an anonymous caller.
    pub fn identity(&self) -> Option<UserRef> {
        match (self.user_id, &self.username) {
            (Some(id), Some(username)) => Some(UserRef {
                id,
                username: username.clone(),
            }),
            _ => None,
        }
    }

    /// Per-session anti-CSRF token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Store `user` in the session under a fresh session id and a fresh token.
/// Returns the token.
pub async fn sign_in(session: &Session, user: &UserRef) -> Result<String, SessionError> {
    session.cycle_id().await?;

    let token = generate_token();
    session.insert(USER_ID_KEY, user.id).await?;
    session.insert(USERNAME_KEY, &user.username).await?;
    session.insert(TOKEN_KEY, &token).await?;

    Ok(token)
}

/// Drop the session record and clear the cookie.
pub async fn sign_out(session: &Session) -> Result<(), SessionError> {
    session.flush().await
}

/// 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Cookie signing key derived from a configured secret of any length.
pub fn signing_key(secret: &str) -> Key {
    // SHA-512 yields exactly the 64 bytes Key requires.
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn fresh_session_is_anonymous() {
        let state = SessionState::load(&session()).await.unwrap();
        assert_eq!(state, SessionState::default());
        assert!(state.identity().is_none());
        assert!(state.token().is_none());
    }

    #[tokio::test]
    async fn sign_in_sets_identity_and_token() {
        let session = session();
        let alice = UserRef {
            id: 7,
            username: "alice".into(),
        };

        let token = sign_in(&session, &alice).await.unwrap();

        let state = SessionState::load(&session).await.unwrap();
        assert_eq!(state.identity(), Some(alice));
        assert_eq!(state.token(), Some(token.as_str()));
    }

    #[tokio::test]
    async fn sign_out_forgets_identity() {
        let session = session();
        let alice = UserRef {
            id: 7,
            username: "alice".into(),
        };
        sign_in(&session, &alice).await.unwrap();

        sign_out(&session).await.unwrap();

        let state = SessionState::load(&session).await.unwrap();
        assert!(state.identity().is_none());
        assert!(state.token().is_none());
    }

    #[test]
    fn tokens_are_hex_and_unique() {
        let a = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, generate_token());
    }

    #[test]
    fn signing_key_is_deterministic() {
        assert_eq!(signing_key("s3cret").master(), signing_key("s3cret").master());
        assert_ne!(signing_key("s3cret").master(), signing_key("other").master());
    }
}
