//! Template store handlers

use crate::auth::Session;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use companion_core::models::{Principle, PrincipleDraft, Template, TemplateStatus};
use companion_services::CreateTemplate;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

fn default_status() -> TemplateStatus {
    TemplateStatus::Draft
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub principles: Vec<PrincipleDraft>,
    #[serde(default = "default_status")]
    pub status: TemplateStatus,
}

/// Standard (seeded) templates
#[utoipa::path(
    get,
    path = "/api/templates/standard",
    tag = "templates",
    responses(
        (status = 200, description = "Published standard templates", body = Vec<Template>)
    )
)]
pub async fn list_standard(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let templates = state.services.templates.list_standard().await?;
    Ok(Json(templates))
}

/// Templates owned by an organization, newest first
#[utoipa::path(
    get,
    path = "/api/templates/{id}/custom",
    tag = "templates",
    params(("id" = Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Draft and published templates", body = Vec<Template>),
        (status = 403, description = "Another organization", body = ErrorResponse)
    )
)]
pub async fn list_custom(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(organization_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let templates = state
        .services
        .templates
        .list_for_organization(&ctx, organization_id)
        .await?;
    Ok(Json(templates))
}

/// Create a custom template (admin only)
#[utoipa::path(
    post,
    path = "/api/templates/{id}/custom",
    tag = "templates",
    params(("id" = Uuid, Path, description = "Organization ID")),
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = Template),
        (status = 400, description = "Blank name or no principles", body = ErrorResponse),
        (status = 403, description = "Admins of the organization only", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, request), fields(user_id = %ctx.user_id))]
pub async fn create_custom(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(organization_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateTemplateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let template = state
        .services
        .templates
        .create_custom(
            &ctx,
            organization_id,
            CreateTemplate {
                name: request.name,
                description: request.description,
                tags: request.tags,
                principles: request.principles,
                status: request.status,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// Publish a draft template (admin only); publishing twice is a no-op
#[utoipa::path(
    post,
    path = "/api/templates/{id}/publish",
    tag = "templates",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Published template", body = Template),
        (status = 403, description = "Standard template or not an admin", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
pub async fn publish(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(template_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let template = state.services.templates.publish(&ctx, template_id).await?;
    Ok(Json(template))
}

/// Principles of the organization's latest published template
#[utoipa::path(
    get,
    path = "/api/org/{id}/principles",
    tag = "templates",
    params(("id" = Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Active principles, possibly empty", body = Vec<Principle>),
        (status = 403, description = "Another organization", body = ErrorResponse)
    )
)]
pub async fn active_principles(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(organization_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let principles = state
        .services
        .templates
        .active_principles(&ctx, organization_id)
        .await?;
    Ok(Json(principles))
}
