use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use companion_core::{AppError, SessionContext};
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Resolve the bearer token to a `SessionContext`.
///
/// The role and organization come from the stored user, so a deleted account or a
/// changed role takes effect before the token expires.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<SessionContext, AppError> {
    let header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = state.services.tokens.verify(token.trim())?;
    let user = state.services.accounts.current_user(&claims).await?;

    Ok(SessionContext::new(user.id, user.organization_id, user.role))
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let authenticated = authenticate(&state, request.headers()).await;
    match authenticated {
        Ok(ctx) => {
            tracing::debug!(
                user_id = %ctx.user_id,
                organization_id = %ctx.organization_id,
                role = %ctx.role,
                "Request authenticated"
            );
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
