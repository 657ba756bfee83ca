//! User repository - credential checks and account creation

use chrono::{SubsecRound, Utc};
use sqlx::SqliteConnection;

use super::DbError;
use crate::models::{generate_salt, hash_password, User, UserRef, Username};

/// User repository
pub struct UserRepo<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> UserRepo<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Check `password` for `username`.
    ///
    /// Returns `None` for an unknown user and for a wrong password alike. On
    /// success the user's `last_access` is bumped.
    pub async fn authenticate(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRef>, DbError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, salt, last_access
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(user) = user.filter(|u| u.verify_password(password)) else {
            return Ok(None);
        };

        self.touch(user.id).await?;
        Ok(Some(user.to_ref()))
    }

    /// Set `last_access` to now.
    pub async fn touch(&mut self, user_id: i64) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET last_access = ? WHERE id = ?")
            .bind(Utc::now().trunc_subsecs(0))
            .bind(user_id)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    /// Create a user with a fresh salt. Returns the new id.
    pub async fn create(&mut self, username: &Username, password: &str) -> Result<i64, DbError> {
        let salt = generate_salt();
        let result: Result<i64, sqlx::Error> = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, password, salt)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(username.as_str())
        .bind(hash_password(&salt, password))
        .bind(&salt)
        .fetch_one(&mut *self.conn)
        .await;

        match result {
            Ok(id) => Ok(id),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(DbError::Conflict {
                resource: "user",
                id: username.as_str().to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
impl UserRepo<'_> {
    /// Fetch a user by id, credentials included.
    pub async fn get(&mut self, user_id: i64) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, salt, last_access
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or_else(|| DbError::NotFound {
            resource: "user",
            id: user_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::temp_pool;

    #[tokio::test]
    async fn authenticates_and_touches_last_access() {
        let (_dir, pool) = temp_pool(1).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = UserRepo::new(&mut conn);

        let id = repo
            .create(&Username::new("alice").unwrap(), "hunter2")
            .await
            .unwrap();
        assert!(repo.get(id).await.unwrap().last_access.is_none());

        let user = repo.authenticate("alice", "hunter2").await.unwrap().unwrap();
        assert_eq!(user, UserRef { id, username: "alice".into() });
        assert!(repo.get(id).await.unwrap().last_access.is_some());
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_both_fail() {
        let (_dir, pool) = temp_pool(1).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = UserRepo::new(&mut conn);

        let id = repo
            .create(&Username::new("alice").unwrap(), "hunter2")
            .await
            .unwrap();

        assert!(repo.authenticate("alice", "wrong").await.unwrap().is_none());
        assert!(repo.authenticate("mallory", "hunter2").await.unwrap().is_none());
        assert!(repo.get(id).await.unwrap().last_access.is_none());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let (_dir, pool) = temp_pool(1).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = UserRepo::new(&mut conn);
        let name = Username::new("alice").unwrap();

        repo.create(&name, "one").await.unwrap();
        let err = repo.create(&name, "two").await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { resource: "user", .. }));
    }

    #[tokio::test]
    async fn salts_differ_per_user() {
        let (_dir, pool) = temp_pool(1).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = UserRepo::new(&mut conn);

        let a = repo.create(&Username::new("a").unwrap(), "same").await.unwrap();
        let b = repo.create(&Username::new("b").unwrap(), "same").await.unwrap();

        let a = repo.get(a).await.unwrap();
        let b = repo.get(b).await.unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.password, b.password);
    }
}
