//! Invitation handlers

use super::ensure_matches;
use crate::auth::Session;
use crate::error::{error_body, ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use companion_core::models::{Invitation, Role};
use companion_core::ErrorMetadata;
use companion_services::{InviteEntry, InviteOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct InviteRequestEntry {
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueInvitationsRequest {
    pub invites: Vec<InviteRequestEntry>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub sender_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteResultStatus {
    Issued,
    Failed,
}

/// Outcome of one entry. The token is shown to the issuer only in this response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteResult {
    pub email: String,
    pub status: InviteResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation: Option<Invitation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<InviteOutcome> for InviteResult {
    fn from(outcome: InviteOutcome) -> Self {
        match outcome {
            InviteOutcome::Issued { invitation, token } => InviteResult {
                email: invitation.email.clone(),
                status: InviteResultStatus::Issued,
                invitation: Some(invitation),
                token: Some(token),
                error: None,
                code: None,
            },
            InviteOutcome::Failed { email, error } => {
                let body = error_body(&error);
                InviteResult {
                    email,
                    status: InviteResultStatus::Failed,
                    invitation: None,
                    token: None,
                    error: Some(body.error),
                    code: Some(error.error_code().to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssueInvitationsResponse {
    /// Number of invitations issued
    pub count: usize,
    pub results: Vec<InviteResult>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListInvitationsQuery {
    pub customer_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
}

/// Issue invitations; each entry succeeds or fails on its own
#[utoipa::path(
    post,
    path = "/api/auth/invite",
    tag = "invitations",
    request_body = IssueInvitationsRequest,
    responses(
        (status = 200, description = "Per-entry results", body = IssueInvitationsResponse),
        (status = 400, description = "Empty or oversized batch", body = ErrorResponse),
        (status = 403, description = "Caller cannot invite", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id))]
pub async fn issue_invitations(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    ValidatedJson(request): ValidatedJson<IssueInvitationsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    ensure_matches("customerId", request.customer_id, ctx.organization_id)?;
    ensure_matches("senderId", request.sender_id, ctx.user_id)?;

    let entries = request
        .invites
        .into_iter()
        .map(|e| InviteEntry {
            email: e.email,
            role: e.role,
        })
        .collect();

    let report = state.services.invitations.issue(&ctx, entries).await?;
    let count = report.issued_count();
    tracing::info!(issued = count, total = report.outcomes.len(), "Invitations processed");

    Ok(Json(IssueInvitationsResponse {
        count,
        results: report.outcomes.into_iter().map(InviteResult::from).collect(),
    }))
}

/// List invitations of the caller's organization
#[utoipa::path(
    get,
    path = "/api/auth/invitations",
    tag = "invitations",
    params(ListInvitationsQuery),
    responses(
        (status = 200, description = "Invitations, newest first", body = Vec<Invitation>),
        (status = 403, description = "Not allowed", body = ErrorResponse)
    )
)]
pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Query(query): Query<ListInvitationsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let organization_id = query.customer_id.unwrap_or(ctx.organization_id);
    let invitations = state
        .services
        .invitations
        .list(&ctx, organization_id, query.sender_id)
        .await?;
    Ok(Json(invitations))
}

/// Revoke a pending invitation
#[utoipa::path(
    delete,
    path = "/api/auth/invitations/{id}",
    tag = "invitations",
    params(("id" = Uuid, Path, description = "Invitation ID")),
    responses(
        (status = 200, description = "Invitation revoked", body = Invitation),
        (status = 404, description = "Invitation not found", body = ErrorResponse),
        (status = 409, description = "Invitation is no longer pending", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx), fields(user_id = %ctx.user_id))]
pub async fn revoke_invitation(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let invitation = state.services.invitations.revoke(&ctx, id).await?;
    Ok(Json(invitation))
}
