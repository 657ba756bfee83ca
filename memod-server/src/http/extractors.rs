//! Custom Axum extractors

use std::convert::Infallible;
use std::str::FromStr;

use axum::extract::{FromRequestParts, Path};
use axum::http::header;
use axum::http::request::Parts;

use super::error::ApiError;

/// Absolute base URL of the site as the client sees it: `X-Forwarded-Host`
/// when behind a proxy, else `Host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(pub String);

impl<S> FromRequestParts<S> for BaseUrl
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let host = header_str(parts, "x-forwarded-host")
            .or_else(|| header_str(parts, header::HOST.as_str()))
            .unwrap_or("localhost");

        Ok(Self(format!("http://{host}")))
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)?
        .to_str()
        .ok()
        .filter(|value| !value.is_empty())
}

/// Extract a memo id from path. Anything that is not an integer is a 404.
pub struct MemoId(pub i64);

impl<S> FromRequestParts<S> for MemoId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parse_path(parts, state).await.map(Self)
    }
}

/// Extract a non-negative page number from path
pub struct PageNumber(pub u32);

impl<S> FromRequestParts<S> for PageNumber
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parse_path(parts, state).await.map(Self)
    }
}

async fn parse_path<T, S>(parts: &mut Parts, state: &S) -> Result<T, ApiError>
where
    T: FromStr + Send,
    S: Send + Sync,
{
    let Path(raw): Path<String> = Path::from_request_parts(parts, state)
        .await
        .map_err(|_| ApiError::NotFound)?;

    raw.parse().map_err(|_| ApiError::NotFound)
}
