//! API error type with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Server-side failures are logged with detail and reach the client as a
//! generic message; a 404 never says whether the record exists.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tower_sessions::session::Error as SessionError;

use crate::db::{DbError, PoolError};
use crate::session::CsrfError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Request rejected, e.g. anti-CSRF token mismatch (400)
    BadRequest,

    /// Missing or hidden resource, empty page (404)
    NotFound,

    /// Storage, pool or session failure (500, logged)
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            Self::BadRequest => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = json!({
            "error": error,
            "message": status.canonical_reason().unwrap_or_default(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { .. } => Self::NotFound,
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl From<PoolError> for ApiError {
    fn from(e: PoolError) -> Self {
        Self::Internal {
            message: e.to_string(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self::Internal {
            message: format!("session: {e}"),
        }
    }
}

impl From<CsrfError> for ApiError {
    fn from(_: CsrfError) -> Self {
        Self::BadRequest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn csrf_mismatch_is_400() {
        let response = ApiError::from(CsrfError).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn not_found_does_not_name_the_record() {
        let err = ApiError::from(DbError::NotFound {
            resource: "memo",
            id: "3".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "not_found");
        assert!(!body.to_string().contains("memo"));
    }

    #[tokio::test]
    async fn internal_error_hides_detail() {
        let response = ApiError::from(PoolError::Closed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal Server Error");
        assert!(!body.to_string().contains("closed"));
    }

    #[test]
    fn conflict_is_internal() {
        let err = ApiError::from(DbError::Conflict {
            resource: "user",
            id: "alice".into(),
        });
        assert!(matches!(err, ApiError::Internal { .. }));
    }
}
