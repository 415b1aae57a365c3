//! Organization roster handlers

use crate::auth::Session;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use companion_core::models::User;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignManagerRequest {
    /// `null` clears the manager
    #[serde(default)]
    pub manager_id: Option<Uuid>,
}

/// List members of the caller's organization
#[utoipa::path(
    get,
    path = "/api/auth/users",
    tag = "users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Members ordered by name", body = Vec<User>),
        (status = 403, description = "Another organization", body = ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let organization_id = query.customer_id.unwrap_or(ctx.organization_id);
    let users = state
        .services
        .accounts
        .list_users(&ctx, organization_id)
        .await?;
    Ok(Json(users))
}

/// Remove a member (admin only)
#[utoipa::path(
    delete,
    path = "/api/auth/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Cannot delete yourself", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx), fields(admin_id = %ctx.user_id))]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.services.accounts.delete_user(&ctx, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Set or clear a member's manager (admin only)
#[utoipa::path(
    put,
    path = "/api/auth/users/{id}/manager",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = AssignManagerRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid manager", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn assign_manager(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AssignManagerRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state
        .services
        .accounts
        .assign_manager(&ctx, id, request.manager_id)
        .await?;
    Ok(Json(user))
}
