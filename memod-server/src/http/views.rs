//! View models handed to the rendering layer
//!
//! Each page is a serializable struct. [`Rendered`] turns one into a JSON
//! response and marks it `Cache-Control: private` when the caller is signed
//! in, so shared caches never hold a personalised page.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Memo, Paginated, Siblings, UserRef};

/// One row of a memo listing.
#[derive(Debug, Clone, Serialize)]
pub struct MemoSummary {
    pub id: i64,
    pub username: String,
    pub title: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Memo> for MemoSummary {
    fn from(memo: &Memo) -> Self {
        Self {
            id: memo.id,
            username: memo.username.clone(),
            title: memo.title().to_owned(),
            is_private: memo.is_private,
            created_at: memo.created_at,
        }
    }
}

/// A memo with its full content.
#[derive(Debug, Clone, Serialize)]
pub struct MemoDetail {
    pub id: i64,
    pub user: i64,
    pub username: String,
    pub title: String,
    pub content: String,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Memo> for MemoDetail {
    fn from(memo: Memo) -> Self {
        Self {
            title: memo.title().to_owned(),
            id: memo.id,
            user: memo.user,
            username: memo.username,
            content: memo.content,
            is_private: memo.is_private,
            created_at: memo.created_at,
            updated_at: memo.updated_at,
        }
    }
}

/// `GET /` and `GET /recent/{page}`
#[derive(Debug, Serialize)]
pub struct FeedView {
    pub base_url: String,
    pub user: Option<UserRef>,
    pub token: Option<String>,
    pub memos: Vec<MemoSummary>,
    pub page: u32,
    pub page_start: i64,
    pub page_end: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl FeedView {
    pub fn new(
        base_url: String,
        user: Option<UserRef>,
        token: Option<String>,
        page: &Paginated<Memo>,
    ) -> Self {
        Self {
            base_url,
            user,
            token,
            memos: page.items.iter().map(MemoSummary::from).collect(),
            page: page.page,
            page_start: page.page_start(),
            page_end: page.page_end(),
            total: page.total,
            has_next: page.has_next(),
            has_prev: page.has_prev(),
        }
    }
}

/// `GET /memo/{id}`
#[derive(Debug, Serialize)]
pub struct MemoView {
    pub base_url: String,
    pub user: Option<UserRef>,
    pub token: Option<String>,
    pub memo: MemoDetail,
    pub older: Option<MemoSummary>,
    pub newer: Option<MemoSummary>,
}

impl MemoView {
    pub fn new(
        base_url: String,
        user: Option<UserRef>,
        token: Option<String>,
        memo: Memo,
        siblings: Siblings<Memo>,
    ) -> Self {
        Self {
            base_url,
            user,
            token,
            memo: memo.into(),
            older: siblings.older.as_ref().map(MemoSummary::from),
            newer: siblings.newer.as_ref().map(MemoSummary::from),
        }
    }
}

/// `GET /mypage`
#[derive(Debug, Serialize)]
pub struct MypageView {
    pub base_url: String,
    pub user: UserRef,
    pub token: Option<String>,
    /// Newest first.
    pub memos: Vec<MemoSummary>,
}

/// `GET /signin` and a failed `POST /signin`
#[derive(Debug, Serialize)]
pub struct SigninView {
    pub base_url: String,
    pub user: Option<UserRef>,
    pub failed: bool,
}

/// A view ready to be sent.
#[derive(Debug)]
pub struct Rendered<T> {
    view: T,
    private: bool,
}

impl<T: Serialize> Rendered<T> {
    /// `private` marks a response built for a signed-in caller.
    pub fn new(view: T, private: bool) -> Self {
        Self { view, private }
    }
}

impl<T: Serialize> IntoResponse for Rendered<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.view).into_response();
        if self.private {
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("private"));
        }
        response
    }
}

/// `302 Found` to `location`.
///
/// axum's `Redirect` only offers 303/307/308.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn memo(id: i64, content: &str) -> Memo {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        Memo {
            id,
            user: 1,
            username: "alice".into(),
            content: content.into(),
            is_private: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn summary_carries_derived_title() {
        let summary = MemoSummary::from(&memo(1, "groceries\nmilk\neggs"));
        assert_eq!(summary.title, "groceries");
        assert_eq!(summary.username, "alice");
    }

    #[test]
    fn feed_view_reports_page_bounds() {
        let page = Paginated {
            items: vec![memo(2, "b"), memo(1, "a")],
            total: 102,
            page: 1,
            per_page: 100,
        };
        let view = FeedView::new("http://localhost".into(), None, None, &page);
        assert_eq!(view.page_start, 101);
        assert_eq!(view.page_end, 200);
        assert_eq!(view.memos.len(), 2);
        assert!(!view.has_next);
        assert!(view.has_prev);
    }

    #[test]
    fn private_rendering_sets_cache_control() {
        let response = Rendered::new(serde_json::json!({}), true).into_response();
        assert_eq!(response.headers()[header::CACHE_CONTROL], "private");

        let response = Rendered::new(serde_json::json!({}), false).into_response();
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[test]
    fn found_is_302_with_location() {
        let response = found("/mypage");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/mypage");
    }
}
