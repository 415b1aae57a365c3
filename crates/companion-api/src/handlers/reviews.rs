//! Review request graph handlers

use crate::auth::Session;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::ensure_matches;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use companion_core::models::{
    ManagerDashboard, Quarter, Ratings, ReviewRequest, ReviewRequestStatus, ReviewSubmission,
};
use companion_core::AppError;
use companion_services::RequestReview;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestReviewRequest {
    pub target_id: Uuid,
    pub reviewer_id: Uuid,
    #[serde(default)]
    pub requester_id: Option<Uuid>,
    /// `YYYY-Qn`; defaults to the current quarter
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2024-Q3")]
    pub quarter: Option<Quarter>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReviewerQuery {
    /// Defaults to the signed-in user
    pub reviewer_id: Option<Uuid>,
    /// Alias of `reviewerId`
    pub user_id: Option<Uuid>,
    /// PENDING, COMPLETED or DECLINED
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitReviewRequest {
    #[schema(value_type = std::collections::BTreeMap<String, companion_core::models::Rating>)]
    pub ratings: Ratings,
}

fn parse_status(raw: &str) -> Result<ReviewRequestStatus, AppError> {
    match raw.trim().to_uppercase().as_str() {
        "PENDING" => Ok(ReviewRequestStatus::Pending),
        "COMPLETED" => Ok(ReviewRequestStatus::Completed),
        "DECLINED" => Ok(ReviewRequestStatus::Declined),
        _ => Err(AppError::InvalidInput(format!(
            "Unknown review status '{}'",
            raw
        ))),
    }
}

/// Ask a reviewer to evaluate a member for a quarter (managers and admins)
#[utoipa::path(
    post,
    path = "/api/reviews/requests",
    tag = "reviews",
    request_body = RequestReviewRequest,
    responses(
        (status = 200, description = "Review requested", body = ReviewRequest),
        (status = 400, description = "Self-review or invalid input", body = ErrorResponse),
        (status = 403, description = "Employees cannot request reviews", body = ErrorResponse),
        (status = 404, description = "Target or reviewer not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, request), fields(user_id = %ctx.user_id))]
pub async fn request_review(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    ValidatedJson(request): ValidatedJson<RequestReviewRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    ensure_matches("requesterId", request.requester_id, ctx.user_id)?;

    let review = state
        .services
        .reviews
        .request_review(
            &ctx,
            RequestReview {
                target_id: request.target_id,
                reviewer_id: request.reviewer_id,
                quarter: request.quarter,
            },
        )
        .await?;
    Ok(Json(review))
}

/// Review requests assigned to a reviewer
#[utoipa::path(
    get,
    path = "/api/reviews/requests",
    tag = "reviews",
    params(ReviewerQuery),
    responses(
        (status = 200, description = "Assigned review requests", body = Vec<ReviewRequest>),
        (status = 403, description = "Not the reviewer or an admin", body = ErrorResponse)
    )
)]
pub async fn list_reviewer_requests(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Query(query): Query<ReviewerQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let reviewer_id = query.reviewer_id.or(query.user_id).unwrap_or(ctx.user_id);
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let requests = state
        .services
        .reviews
        .list_for_reviewer(&ctx, reviewer_id, status)
        .await?;
    Ok(Json(requests))
}

/// Submit ratings for an assigned review; completes the request
#[utoipa::path(
    post,
    path = "/api/reviews/requests/{id}/submission",
    tag = "reviews",
    params(("id" = Uuid, Path, description = "Review request ID")),
    request_body = SubmitReviewRequest,
    responses(
        (status = 200, description = "Review submitted", body = ReviewSubmission),
        (status = 400, description = "Missing or out-of-range scores", body = ErrorResponse),
        (status = 403, description = "Not the assigned reviewer", body = ErrorResponse),
        (status = 409, description = "Already submitted or declined", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx, request), fields(user_id = %ctx.user_id))]
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(review_request_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SubmitReviewRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let submission = state
        .services
        .reviews
        .submit(&ctx, review_request_id, request.ratings)
        .await?;
    Ok(Json(submission))
}

/// Read the submission of a completed review
#[utoipa::path(
    get,
    path = "/api/reviews/requests/{id}/submission",
    tag = "reviews",
    params(("id" = Uuid, Path, description = "Review request ID")),
    responses(
        (status = 200, description = "Submitted ratings", body = ReviewSubmission),
        (status = 404, description = "Not submitted yet", body = ErrorResponse)
    )
)]
pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(review_request_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let submission = state
        .services
        .reviews
        .submission(&ctx, review_request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Review has not been submitted".to_string()))?;
    Ok(Json(submission))
}

/// Decline a pending review
#[utoipa::path(
    post,
    path = "/api/reviews/requests/{id}/decline",
    tag = "reviews",
    params(("id" = Uuid, Path, description = "Review request ID")),
    responses(
        (status = 200, description = "Review declined", body = ReviewRequest),
        (status = 403, description = "Not the assigned reviewer", body = ErrorResponse),
        (status = 409, description = "Not pending", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, ctx), fields(user_id = %ctx.user_id))]
pub async fn decline_review(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(review_request_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let review = state
        .services
        .reviews
        .decline(&ctx, review_request_id)
        .await?;
    Ok(Json(review))
}

/// Reviews of a manager's direct reports, grouped by quarter
#[utoipa::path(
    get,
    path = "/api/reviews/dashboard/manager/{id}",
    tag = "reviews",
    params(("id" = Uuid, Path, description = "Manager user ID")),
    responses(
        (status = 200, description = "Dashboard", body = ManagerDashboard),
        (status = 403, description = "Not the manager or an admin", body = ErrorResponse)
    )
)]
pub async fn manager_dashboard(
    State(state): State<Arc<AppState>>,
    Session(ctx): Session,
    Path(manager_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let dashboard = state
        .services
        .reviews
        .list_for_manager(&ctx, manager_id)
        .await?;
    Ok(Json(dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_is_case_insensitive() {
        assert_eq!(parse_status("pending").ok(), Some(ReviewRequestStatus::Pending));
        assert_eq!(parse_status(" Completed ").ok(), Some(ReviewRequestStatus::Completed));
        assert!(parse_status("started").is_err());
    }
}
