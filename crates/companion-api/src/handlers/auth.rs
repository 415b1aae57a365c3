//! Signup, login and invitation redemption.

use crate::auth::Session;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use companion_core::models::User;
use companion_services::SignupOrganization;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub org_name: String,
    pub admin_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionData {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub success: bool,
    pub data: SessionData,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub org_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub user: User,
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptInvitationRequest {
    pub token: String,
    pub name: String,
    pub password: String,
}

/// Create an organization and its first admin
#[utoipa::path(
    post,
    path = "/api/auth/signup-org",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Organization created", body = SignupResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Organization already exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signup_org(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state
        .services
        .accounts
        .signup_org(SignupOrganization {
            org_name: request.org_name,
            admin_name: request.admin_name,
            email: request.email,
            password: request.password,
        })
        .await?;

    Ok(Json(SignupResponse {
        success: true,
        data: SessionData {
            user: session.user,
            token: session.token,
        },
    }))
}

/// Sign in with email, organization name and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state
        .services
        .accounts
        .login(&request.email, &request.org_name, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        user: session.user,
        token: session.token,
    }))
}

/// Redeem an invitation token for a new account
#[utoipa::path(
    post,
    path = "/api/auth/invite/accept",
    tag = "auth",
    request_body = AcceptInvitationRequest,
    responses(
        (status = 200, description = "Account created", body = SessionData),
        (status = 400, description = "Invalid name or password", body = ErrorResponse),
        (status = 404, description = "Unknown token", body = ErrorResponse),
        (status = 409, description = "Invitation already used", body = ErrorResponse),
        (status = 410, description = "Invitation expired or revoked", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AcceptInvitationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state
        .services
        .invitations
        .redeem(&request.token, &request.name, &request.password)
        .await?;

    Ok(Json(SessionData {
        user: session.user,
        token: session.token,
    }))
}

/// The signed-in user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state.services.accounts.current_user(&ctx).await?;
    Ok(Json(user))
}
