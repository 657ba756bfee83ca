//! Memo repository
//!
//! Ordering rules:
//! - public feed: newest first, `(created_at DESC, id DESC)`
//! - owner timeline: oldest first, `(created_at ASC, id ASC)`
//!
//! The id tie-break keeps pages and sibling links stable when several memos
//! share a created_at second.

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::SqliteConnection;

use super::DbError;
use crate::models::{first_line, siblings_of, Memo, PageRequest, Paginated, Siblings};

/// Memo repository
pub struct MemoRepo<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> MemoRepo<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Number of public memos.
    pub async fn count_public(&mut self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memos WHERE is_private = 0")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }

    /// Public memos, newest first. An offset past the end yields an empty
    /// list.
    pub async fn list_public(&mut self, limit: i64, offset: i64) -> Result<Vec<Memo>, DbError> {
        let memos = sqlx::query_as::<_, Memo>(
            r#"
            SELECT m.id, m."user", u.username, m.content, m.is_private,
                   m.created_at, m.updated_at
            FROM memos m
            INNER JOIN users u ON u.id = m."user"
            WHERE m.is_private = 0
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(memos)
    }

    /// One page of the public feed with the total count.
    pub async fn public_page(&mut self, page: PageRequest) -> Result<Paginated<Memo>, DbError> {
        let total = self.count_public().await?;
        let items = self.list_public(page.limit(), page.offset()).await?;

        Ok(Paginated {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    /// All memos of `user_id`, oldest first. Private memos are included only
    /// when `include_private` is set.
    pub async fn list_by_owner(
        &mut self,
        user_id: i64,
        include_private: bool,
    ) -> Result<Vec<Memo>, DbError> {
        let memos = sqlx::query_as::<_, Memo>(
            r#"
            SELECT m.id, m."user", u.username, m.content, m.is_private,
                   m.created_at, m.updated_at
            FROM memos m
            INNER JOIN users u ON u.id = m."user"
            WHERE m."user" = ? AND (? OR m.is_private = 0)
            ORDER BY m.created_at ASC, m.id ASC
            "#,
        )
        .bind(user_id)
        .bind(include_private)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(memos)
    }

    /// Fetch a memo regardless of visibility.
    pub async fn get(&mut self, memo_id: i64) -> Result<Option<Memo>, DbError> {
        let memo = sqlx::query_as::<_, Memo>(
            r#"
            SELECT m.id, m."user", u.username, m.content, m.is_private,
                   m.created_at, m.updated_at
            FROM memos m
            INNER JOIN users u ON u.id = m."user"
            WHERE m.id = ?
            "#,
        )
        .bind(memo_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(memo)
    }

    /// Fetch a memo as seen by `viewer`. Missing and hidden memos produce the
    /// same `NotFound`.
    pub async fn get_visible(&mut self, memo_id: i64, viewer: Option<i64>) -> Result<Memo, DbError> {
        self.get(memo_id)
            .await?
            .filter(|memo| memo.is_visible_to(viewer))
            .ok_or_else(|| DbError::NotFound {
                resource: "memo",
                id: memo_id.to_string(),
            })
    }

    /// Older and newer neighbours of `memo_id` in `owner_id`'s timeline.
    ///
    /// Without `include_private` the timeline is filtered to public memos
    /// first, so a hidden neighbour is skipped rather than revealed.
    pub async fn find_siblings(
        &mut self,
        memo_id: i64,
        owner_id: i64,
        include_private: bool,
    ) -> Result<Siblings<Memo>, DbError> {
        let timeline = self.list_by_owner(owner_id, include_private).await?;
        Ok(siblings_of(&timeline, memo_id))
    }

    /// Insert a memo stamped with the current time. Returns the new id.
    pub async fn create(
        &mut self,
        owner_id: i64,
        content: &str,
        is_private: bool,
    ) -> Result<i64, DbError> {
        self.create_at(owner_id, content, is_private, Utc::now()).await
    }

    /// Insert a memo stamped with `at`, truncated to whole seconds.
    pub async fn create_at(
        &mut self,
        owner_id: i64,
        content: &str,
        is_private: bool,
        at: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        let at = at.trunc_subsecs(0);
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO memos ("user", title, content, is_private, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(first_line(content))
        .bind(content)
        .bind(is_private)
        .bind(at)
        .bind(at)
        .fetch_one(&mut *self.conn)
        .await?;

        tracing::debug!(memo_id = id, owner_id, is_private, "memo created");
        Ok(id)
    }
}
