//! Memo endpoints

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use super::auth::CsrfParams;
use crate::db::MemoRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{BaseUrl, MemoId};
use crate::http::views::{found, MemoSummary, MemoView, MypageView, Rendered};
use crate::session::{verify_csrf, SessionState};
use crate::state::AppState;

/// New memo form body
#[derive(Debug, Deserialize)]
pub struct NewMemoForm {
    pub sid: Option<String>,
    #[serde(default)]
    pub content: String,
    pub is_private: Option<String>,
}

impl NewMemoForm {
    /// Only the literal `"1"` marks a memo private.
    pub fn is_private(&self) -> bool {
        self.is_private.as_deref() == Some("1")
    }
}

/// GET /mypage - the caller's memos, private included, newest first
async fn mypage(
    State(state): State<AppState>,
    session: Session,
    BaseUrl(base_url): BaseUrl,
) -> Result<Response, ApiError> {
    let session = SessionState::load(&session).await?;
    let mut conn = state.pool().acquire().await?;
    let Some(user) = session.identity() else {
        return Ok(found("/"));
    };

    let memos = MemoRepo::new(&mut conn).list_by_owner(user.id, true).await?;
    drop(conn);

    let view = MypageView {
        base_url,
        token: session.token().map(str::to_owned),
        memos: memos.iter().rev().map(MemoSummary::from).collect(),
        user,
    };
    Ok(Rendered::new(view, true).into_response())
}

/// GET /memo/{id}
///
/// Missing and hidden memos are the same 404. Non-owners only see public
/// neighbours.
async fn show_memo(
    State(state): State<AppState>,
    session: Session,
    BaseUrl(base_url): BaseUrl,
    MemoId(memo_id): MemoId,
) -> Result<Response, ApiError> {
    let session = SessionState::load(&session).await?;
    let mut conn = state.pool().acquire().await?;
    let user = session.identity();
    let viewer = user.as_ref().map(|u| u.id);

    let mut repo = MemoRepo::new(&mut conn);
    let memo = repo.get_visible(memo_id, viewer).await?;
    let is_owner = viewer == Some(memo.user);
    let siblings = repo.find_siblings(memo.id, memo.user, is_owner).await?;
    drop(conn);

    let private = user.is_some();
    let token = session.token().map(str::to_owned);
    let view = MemoView::new(base_url, user, token, memo, siblings);
    Ok(Rendered::new(view, private).into_response())
}

/// POST /memo
///
/// The anti-CSRF token is read from the body, falling back to `?sid=`.
/// Anonymous callers are redirected before the body is looked at.
async fn create_memo(
    State(state): State<AppState>,
    session: Session,
    query: Result<Query<CsrfParams>, QueryRejection>,
    form: Result<Form<NewMemoForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let session = SessionState::load(&session).await?;
    let Some(user) = session.identity() else {
        return Ok(found("/"));
    };

    let Form(form) = form.map_err(|e| {
        tracing::debug!("rejected memo form: {e}");
        ApiError::BadRequest
    })?;
    let query_sid = query.ok().and_then(|Query(params)| params.sid);
    let sid = form.sid.as_deref().or(query_sid.as_deref());
    verify_csrf(&session, sid)?;

    let mut conn = state.pool().acquire().await?;
    let memo_id = MemoRepo::new(&mut conn)
        .create(user.id, &form.content, form.is_private())
        .await?;
    drop(conn);

    tracing::info!(user_id = user.id, memo_id, "memo created");
    Ok(found(&format!("/memo/{memo_id}")))
}

/// Memo routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mypage", get(mypage))
        .route("/memo", post(create_memo))
        .route("/memo/{id}", get(show_memo))
}
