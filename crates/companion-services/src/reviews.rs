//! Review request graph: who reviews whom, per quarter.

use chrono::Utc;
use companion_core::constants::{MAX_RATING_SCORE, MIN_RATING_SCORE};
use companion_core::models::{
    DashboardEntry, DashboardStatus, ManagerDashboard, NewReviewRequest, Quarter, Ratings,
    ReviewRequest, ReviewRequestStatus, ReviewSubmission, User, UserSummary,
};
use companion_core::{AppError, SessionContext};
use companion_db::{ManagedReview, ReviewRepository, UserRepository};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RequestReview {
    pub target_id: Uuid,
    pub reviewer_id: Uuid,
    /// Defaults to the current UTC quarter.
    pub quarter: Option<Quarter>,
}

fn dashboard_status(status: ReviewRequestStatus) -> DashboardStatus {
    match status {
        ReviewRequestStatus::Completed => DashboardStatus::Completed,
        ReviewRequestStatus::Pending | ReviewRequestStatus::Declined => {
            DashboardStatus::NotStarted
        }
    }
}

fn validate_ratings(ratings: &Ratings) -> Result<(), AppError> {
    if ratings.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one rating is required".to_string(),
        ));
    }
    for (principle_id, rating) in ratings {
        if !(MIN_RATING_SCORE..=MAX_RATING_SCORE).contains(&rating.score) {
            return Err(AppError::InvalidInput(format!(
                "Score for principle {} must be between {} and {}, got {}",
                principle_id, MIN_RATING_SCORE, MAX_RATING_SCORE, rating.score
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    users: Arc<dyn UserRepository>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { reviews, users }
    }

    async fn member(&self, ctx: &SessionContext, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.organization_id == ctx.organization_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Self, or an admin of the same organization.
    async fn require_self_or_admin(
        &self,
        ctx: &SessionContext,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        if ctx.user_id == user_id {
            return Ok(());
        }
        ctx.require_admin()?;
        self.member(ctx, user_id).await.map(|_| ())
    }

    async fn assigned_request(
        &self,
        ctx: &SessionContext,
        review_request_id: Uuid,
    ) -> Result<ReviewRequest, AppError> {
        let request = self
            .reviews
            .find_by_id(review_request_id)
            .await?
            .filter(|r| r.organization_id == ctx.organization_id)
            .ok_or_else(|| AppError::NotFound("Review request not found".to_string()))?;

        if request.reviewer_id != ctx.user_id {
            return Err(AppError::Forbidden(
                "Only the assigned reviewer can act on this review".to_string(),
            ));
        }
        Ok(request)
    }

    #[tracing::instrument(skip(self, ctx), fields(requester_id = %ctx.user_id))]
    pub async fn request_review(
        &self,
        ctx: &SessionContext,
        request: RequestReview,
    ) -> Result<ReviewRequest, AppError> {
        ctx.require_people_manager()?;
        if request.target_id == request.reviewer_id {
            return Err(AppError::InvalidInput(
                "A user cannot be asked to review themselves".to_string(),
            ));
        }

        let target = self.member(ctx, request.target_id).await?;
        let reviewer = self.member(ctx, request.reviewer_id).await?;

        self.reviews
            .create(NewReviewRequest {
                organization_id: ctx.organization_id,
                quarter: request.quarter.unwrap_or_else(Quarter::current),
                target_id: target.id,
                reviewer_id: reviewer.id,
                requester_id: ctx.user_id,
            })
            .await
    }

    /// Reviews of the manager's direct reports, grouped by quarter.
    pub async fn list_for_manager(
        &self,
        ctx: &SessionContext,
        manager_id: Uuid,
    ) -> Result<ManagerDashboard, AppError> {
        self.require_self_or_admin(ctx, manager_id).await?;

        let mut dashboard = ManagerDashboard::default();
        for ManagedReview {
            request,
            target,
            reviewer,
        } in self.reviews.list_for_manager(manager_id).await?
        {
            dashboard
                .quarters
                .entry(request.quarter.to_string())
                .or_default()
                .push(DashboardEntry {
                    review_id: request.id,
                    reportee: UserSummary::from(&target),
                    reviewer: UserSummary::from(&reviewer),
                    status: dashboard_status(request.status),
                    request_status: request.status,
                });
        }
        Ok(dashboard)
    }

    pub async fn list_for_reviewer(
        &self,
        ctx: &SessionContext,
        reviewer_id: Uuid,
        status: Option<ReviewRequestStatus>,
    ) -> Result<Vec<ReviewRequest>, AppError> {
        self.require_self_or_admin(ctx, reviewer_id).await?;
        self.reviews.list_for_reviewer(reviewer_id, status).await
    }

    /// Record the reviewer's ratings and complete the request. No resubmission.
    #[tracing::instrument(skip(self, ctx, ratings), fields(reviewer_id = %ctx.user_id))]
    pub async fn submit(
        &self,
        ctx: &SessionContext,
        review_request_id: Uuid,
        ratings: Ratings,
    ) -> Result<ReviewSubmission, AppError> {
        let request = self.assigned_request(ctx, review_request_id).await?;
        match request.status {
            ReviewRequestStatus::Pending => {}
            ReviewRequestStatus::Completed => {
                return Err(AppError::InvalidState(
                    "Review already submitted".to_string(),
                ));
            }
            ReviewRequestStatus::Declined => {
                return Err(AppError::InvalidState(
                    "Review was declined and cannot be submitted".to_string(),
                ));
            }
        }
        validate_ratings(&ratings)?;

        self.reviews
            .complete(review_request_id, ratings, Utc::now())
            .await?
            .ok_or_else(|| AppError::InvalidState("Review already submitted".to_string()))
    }

    /// PENDING -> DECLINED, by the assigned reviewer.
    #[tracing::instrument(skip(self, ctx), fields(reviewer_id = %ctx.user_id))]
    pub async fn decline(
        &self,
        ctx: &SessionContext,
        review_request_id: Uuid,
    ) -> Result<ReviewRequest, AppError> {
        let request = self.assigned_request(ctx, review_request_id).await?;
        if request.status != ReviewRequestStatus::Pending {
            return Err(AppError::InvalidState(
                "Only pending reviews can be declined".to_string(),
            ));
        }

        self.reviews
            .decline(review_request_id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState("Only pending reviews can be declined".to_string())
            })
    }

    pub async fn submission(
        &self,
        ctx: &SessionContext,
        review_request_id: Uuid,
    ) -> Result<Option<ReviewSubmission>, AppError> {
        let request = self
            .reviews
            .find_by_id(review_request_id)
            .await?
            .filter(|r| r.organization_id == ctx.organization_id)
            .ok_or_else(|| AppError::NotFound("Review request not found".to_string()))?;
        if request.reviewer_id != ctx.user_id && !ctx.role.can_manage_people() {
            return Err(AppError::Forbidden(
                "Only the reviewer, managers and admins can read submissions".to_string(),
            ));
        }
        self.reviews.find_submission(review_request_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::models::Rating;

    #[test]
    fn test_scores_outside_range_rejected() {
        let mut ratings = Ratings::new();
        ratings.insert(
            Uuid::new_v4(),
            Rating {
                score: 6,
                comment: "x".to_string(),
            },
        );
        assert!(matches!(
            validate_ratings(&ratings),
            Err(AppError::InvalidInput(_))
        ));

        ratings.values_mut().for_each(|r| r.score = 0);
        assert!(validate_ratings(&ratings).is_err());

        ratings.values_mut().for_each(|r| r.score = 5);
        assert!(validate_ratings(&ratings).is_ok());
    }

    #[test]
    fn test_empty_ratings_rejected() {
        assert!(validate_ratings(&Ratings::new()).is_err());
    }

    #[test]
    fn test_dashboard_status_is_binary() {
        assert_eq!(
            dashboard_status(ReviewRequestStatus::Completed),
            DashboardStatus::Completed
        );
        assert_eq!(
            dashboard_status(ReviewRequestStatus::Pending),
            DashboardStatus::NotStarted
        );
    }
}
