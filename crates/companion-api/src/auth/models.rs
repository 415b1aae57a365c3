use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use companion_core::{AppError, SessionContext};

/// The caller's identity, inserted into request extensions by the auth middleware.
///
/// `SessionContext` lives in companion-core, so the extractor is a local newtype.
#[derive(Debug, Clone, Copy)]
pub struct Session(pub SessionContext);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .copied()
            .map(Session)
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing session context".to_string(),
                ))
            })
    }
}
