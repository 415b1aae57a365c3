use async_trait::async_trait;
use chrono::{DateTime, Utc};
use companion_core::models::{
    NewReviewRequest, Ratings, ReviewRequest, ReviewRequestStatus, ReviewSubmission,
    Role, User,
};
use companion_core::AppError;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use super::db_error;
use crate::db::traits::{ManagedReview, ReviewRepository};

const REQUEST_COLUMNS: &str =
    "id, organization_id, quarter, target_id, reviewer_id, requester_id, status, created_at";

#[derive(FromRow)]
struct SubmissionRow {
    id: Uuid,
    review_request_id: Uuid,
    ratings: Json<Ratings>,
    submitted_at: DateTime<Utc>,
}

impl From<SubmissionRow> for ReviewSubmission {
    fn from(row: SubmissionRow) -> Self {
        ReviewSubmission {
            id: row.id,
            review_request_id: row.review_request_id,
            ratings: row.ratings.0,
            submitted_at: row.submitted_at,
        }
    }
}

#[derive(FromRow)]
struct ManagedRow {
    #[sqlx(flatten)]
    request: ReviewRequest,
    target_name: String,
    target_email: String,
    target_role: Role,
    target_manager_id: Option<Uuid>,
    target_created_at: DateTime<Utc>,
    reviewer_name: String,
    reviewer_email: String,
    reviewer_role: Role,
    reviewer_manager_id: Option<Uuid>,
    reviewer_created_at: DateTime<Utc>,
}

impl From<ManagedRow> for ManagedReview {
    fn from(row: ManagedRow) -> Self {
        let organization_id = row.request.organization_id;
        let target = User {
            id: row.request.target_id,
            organization_id,
            name: row.target_name,
            email: row.target_email,
            role: row.target_role,
            manager_id: row.target_manager_id,
            created_at: row.target_created_at,
        };
        let reviewer = User {
            id: row.request.reviewer_id,
            organization_id,
            name: row.reviewer_name,
            email: row.reviewer_email,
            role: row.reviewer_role,
            manager_id: row.reviewer_manager_id,
            created_at: row.reviewer_created_at,
        };
        ManagedReview {
            request: row.request,
            target,
            reviewer,
        }
    }
}

#[derive(Clone)]
pub struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    #[tracing::instrument(skip(self, request), fields(db.table = "review_requests", db.operation = "insert"))]
    async fn create(&self, request: NewReviewRequest) -> Result<ReviewRequest, AppError> {
        // Uniqueness of (target, reviewer, quarter) is enforced by the table constraint.
        let created = sqlx::query_as::<Postgres, ReviewRequest>(&format!(
            r#"
            INSERT INTO review_requests (id, organization_id, quarter, target_id, reviewer_id, requester_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.organization_id)
        .bind(&request.quarter)
        .bind(request.target_id)
        .bind(request.reviewer_id)
        .bind(request.requester_id)
        .bind(ReviewRequestStatus::Pending)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Duplicate(_) => AppError::Duplicate(format!(
                "Review already requested for this reviewer in {}",
                request.quarter
            )),
            other => {
                tracing::error!(error = %other, "Failed to create review request");
                other
            }
        })?;

        tracing::info!(
            review_request_id = %created.id,
            target_id = %created.target_id,
            reviewer_id = %created.reviewer_id,
            quarter = %created.quarter,
            "Review requested"
        );

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "review_requests", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ReviewRequest>, AppError> {
        sqlx::query_as::<Postgres, ReviewRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM review_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get review request"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "review_requests", db.operation = "select"))]
    async fn list_for_reviewer(
        &self,
        reviewer_id: Uuid,
        status: Option<ReviewRequestStatus>,
    ) -> Result<Vec<ReviewRequest>, AppError> {
        sqlx::query_as::<Postgres, ReviewRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM review_requests
            WHERE reviewer_id = $1 AND ($2::review_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(reviewer_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list reviewer requests"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "review_requests", db.operation = "select"))]
    async fn list_for_manager(&self, manager_id: Uuid) -> Result<Vec<ManagedReview>, AppError> {
        let rows = sqlx::query_as::<Postgres, ManagedRow>(
            r#"
            SELECT
                r.id, r.organization_id, r.quarter, r.target_id, r.reviewer_id,
                r.requester_id, r.status, r.created_at,
                t.name AS target_name, t.email AS target_email, t.role AS target_role,
                t.manager_id AS target_manager_id, t.created_at AS target_created_at,
                v.name AS reviewer_name, v.email AS reviewer_email, v.role AS reviewer_role,
                v.manager_id AS reviewer_manager_id, v.created_at AS reviewer_created_at
            FROM review_requests r
            JOIN users t ON t.id = r.target_id
            JOIN users v ON v.id = r.reviewer_id
            WHERE t.manager_id = $1
            ORDER BY r.quarter DESC, LOWER(t.name), r.created_at
            "#,
        )
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list manager reviews"))?;

        Ok(rows.into_iter().map(ManagedReview::from).collect())
    }

    #[tracing::instrument(skip(self, ratings), fields(db.table = "review_submissions", db.operation = "insert"))]
    async fn complete(
        &self,
        id: Uuid,
        ratings: Ratings,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewSubmission>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin submission transaction"))?;

        let updated = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            UPDATE review_requests
            SET status = 'COMPLETED'
            WHERE id = $1 AND status = 'PENDING'
            RETURNING id
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("complete review request"))?;

        if updated.is_none() {
            tx.rollback()
                .await
                .map_err(db_error("rollback submission transaction"))?;
            return Ok(None);
        }

        let row = sqlx::query_as::<Postgres, SubmissionRow>(
            r#"
            INSERT INTO review_submissions (id, review_request_id, ratings, submitted_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, review_request_id, ratings, submitted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(Json(&ratings))
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("create review submission"))?;

        tx.commit()
            .await
            .map_err(db_error("commit submission transaction"))?;

        let submission = ReviewSubmission::from(row);
        tracing::info!(
            review_request_id = %id,
            submission_id = %submission.id,
            rating_count = submission.ratings.len(),
            "Review submitted"
        );

        Ok(Some(submission))
    }

    #[tracing::instrument(skip(self), fields(db.table = "review_requests", db.operation = "update"))]
    async fn decline(&self, id: Uuid) -> Result<Option<ReviewRequest>, AppError> {
        let declined = sqlx::query_as::<Postgres, ReviewRequest>(&format!(
            r#"
            UPDATE review_requests
            SET status = 'DECLINED'
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("decline review request"))?;

        if let Some(ref request) = declined {
            tracing::info!(review_request_id = %request.id, "Review declined");
        }

        Ok(declined)
    }

    #[tracing::instrument(skip(self), fields(db.table = "review_submissions", db.operation = "select"))]
    async fn find_submission(
        &self,
        review_request_id: Uuid,
    ) -> Result<Option<ReviewSubmission>, AppError> {
        let row = sqlx::query_as::<Postgres, SubmissionRow>(
            r#"
            SELECT id, review_request_id, ratings, submitted_at
            FROM review_submissions
            WHERE review_request_id = $1
            "#,
        )
        .bind(review_request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get review submission"))?;

        Ok(row.map(ReviewSubmission::from))
    }
}
