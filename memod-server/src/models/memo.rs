//! Memo records, title derivation, visibility and sibling rules

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Memo joined with its owner's username.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Memo {
    pub id: i64,
    /// Owning user id.
    pub user: i64,
    pub username: String,
    pub content: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Memo {
    /// First line of the content.
    pub fn title(&self) -> &str {
        first_line(&self.content)
    }

    /// Whether `viewer` may see this memo.
    pub fn is_visible_to(&self, viewer: Option<i64>) -> bool {
        is_visible_to(self.is_private, self.user, viewer)
    }
}

/// Text up to the first `\n`, or the whole string when there is none.
pub fn first_line(content: &str) -> &str {
    content.split('\n').next().unwrap_or(content)
}

/// Visibility policy shared by every read path: private memos are visible to
/// their owner only, everything else to everyone (anonymous included).
pub fn is_visible_to(is_private: bool, owner: i64, viewer: Option<i64>) -> bool {
    !is_private || viewer == Some(owner)
}

/// Immediate neighbours of a memo inside one owner's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Siblings<T> {
    pub older: Option<T>,
    pub newer: Option<T>,
}

impl<T> Default for Siblings<T> {
    fn default() -> Self {
        Self {
            older: None,
            newer: None,
        }
    }
}

/// Locate `memo_id` in `timeline` (oldest first) and return its neighbours.
///
/// The caller is responsible for filtering the timeline to what the viewer
/// may see before calling this, so hidden memos are never reported.
pub fn siblings_of(timeline: &[Memo], memo_id: i64) -> Siblings<Memo> {
    let Some(pos) = timeline.iter().position(|m| m.id == memo_id) else {
        return Siblings::default();
    };

    Siblings {
        older: pos.checked_sub(1).and_then(|i| timeline.get(i)).cloned(),
        newer: timeline.get(pos + 1).cloned(),
    }
}
