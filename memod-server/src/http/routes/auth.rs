//! Sign-in and sign-out

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::db::UserRepo;
use crate::http::error::ApiError;
use crate::http::extractors::BaseUrl;
use crate::http::views::{found, Rendered, SigninView};
use crate::session::{sign_in, sign_out, verify_csrf, SessionState};
use crate::state::AppState;

/// Sign-in form body. Missing fields are treated as empty strings.
#[derive(Debug, Deserialize)]
pub struct SigninForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Anti-CSRF token passed as `?sid=`
#[derive(Debug, Deserialize)]
pub struct CsrfParams {
    pub sid: Option<String>,
}

/// GET /signin
async fn signin_form(session: Session, BaseUrl(base_url): BaseUrl) -> Result<Response, ApiError> {
    let session = SessionState::load(&session).await?;
    let user = session.identity();
    let private = user.is_some();

    let view = SigninView {
        base_url,
        user,
        failed: false,
    };
    Ok(Rendered::new(view, private).into_response())
}

/// POST /signin
///
/// Unknown user and wrong password produce the same response.
async fn signin(
    State(state): State<AppState>,
    session: Session,
    BaseUrl(base_url): BaseUrl,
    Form(form): Form<SigninForm>,
) -> Result<Response, ApiError> {
    SessionState::load(&session).await?;
    let mut conn = state.pool().acquire().await?;

    let user = UserRepo::new(&mut conn)
        .authenticate(&form.username, &form.password)
        .await?;
    drop(conn);

    match user {
        Some(user) => {
            sign_in(&session, &user).await?;
            tracing::info!(user_id = user.id, "signed in");
            Ok(found("/mypage"))
        }
        None => {
            tracing::debug!("sign-in failed");
            let view = SigninView {
                base_url,
                user: None,
                failed: true,
            };
            Ok(Rendered::new(view, false).into_response())
        }
    }
}

/// GET /signout?sid=
async fn signout(
    session: Session,
    Query(params): Query<CsrfParams>,
) -> Result<Response, ApiError> {
    let state = SessionState::load(&session).await?;
    let Some(user) = state.identity() else {
        return Ok(found("/"));
    };

    verify_csrf(&state, params.sid.as_deref())?;
    sign_out(&session).await?;
    tracing::info!(user_id = user.id, "signed out");

    Ok(found("/"))
}

/// Authentication routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signin", get(signin_form).post(signin))
        .route("/signout", get(signout))
}
