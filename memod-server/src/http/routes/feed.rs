//! Public feed endpoints

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_sessions::Session;

use crate::db::MemoRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{BaseUrl, PageNumber};
use crate::http::views::{FeedView, Rendered};
use crate::models::PageRequest;
use crate::session::SessionState;
use crate::state::AppState;

/// GET / - first page of the public feed, empty or not
async fn index(
    State(state): State<AppState>,
    session: Session,
    BaseUrl(base_url): BaseUrl,
) -> Result<Response, ApiError> {
    public_feed(&state, &session, base_url, 0, EmptyPage::Render).await
}

/// GET /recent/{page} - later pages; an empty page is a 404
async fn recent(
    State(state): State<AppState>,
    session: Session,
    BaseUrl(base_url): BaseUrl,
    PageNumber(page): PageNumber,
) -> Result<Response, ApiError> {
    public_feed(&state, &session, base_url, page, EmptyPage::NotFound).await
}

/// What a page with no rows turns into.
#[derive(Clone, Copy, PartialEq, Eq)]
enum EmptyPage {
    Render,
    NotFound,
}

async fn public_feed(
    state: &AppState,
    session: &Session,
    base_url: String,
    page: u32,
    on_empty: EmptyPage,
) -> Result<Response, ApiError> {
    let session = SessionState::load(session).await?;
    let mut conn = state.pool().acquire().await?;
    let user = session.identity();

    let page = MemoRepo::new(&mut conn)
        .public_page(PageRequest::feed(page))
        .await?;
    drop(conn);

    if page.is_empty() && on_empty == EmptyPage::NotFound {
        return Err(ApiError::NotFound);
    }

    let private = user.is_some();
    let token = session.token().map(str::to_owned);
    let view = FeedView::new(base_url, user, token, &page);
    Ok(Rendered::new(view, private).into_response())
}

/// Feed routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/recent/{page}", get(recent))
}
