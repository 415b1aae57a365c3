use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Quarter, UserSummary};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "review_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewRequestStatus {
    Pending,
    Completed,
    Declined,
}

/// A scheduled obligation for `reviewer_id` to evaluate `target_id` in `quarter`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub quarter: Quarter,
    pub target_id: Uuid,
    pub reviewer_id: Uuid,
    pub requester_id: Uuid,
    pub status: ReviewRequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReviewRequest {
    pub organization_id: Uuid,
    pub quarter: Quarter,
    pub target_id: Uuid,
    pub reviewer_id: Uuid,
    pub requester_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Rating {
    pub score: i32,
    #[serde(default)]
    pub comment: String,
}

/// Ratings keyed by principle id.
pub type Ratings = BTreeMap<Uuid, Rating>;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    pub id: Uuid,
    pub review_request_id: Uuid,
    #[schema(value_type = std::collections::BTreeMap<String, Rating>)]
    pub ratings: Ratings,
    pub submitted_at: DateTime<Utc>,
}

/// Status of a target-reviewer pairing as shown on the manager dashboard.
///
/// Only `NotStarted` and `Completed` are produced: there is no partial-save model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DashboardStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEntry {
    pub review_id: Uuid,
    pub reportee: UserSummary,
    pub reviewer: UserSummary,
    pub status: DashboardStatus,
    pub request_status: ReviewRequestStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ManagerDashboard {
    pub quarters: BTreeMap<String, Vec<DashboardEntry>>,
}
