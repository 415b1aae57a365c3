//! Repository seams.
//!
//! Every aggregate has one trait with a PostgreSQL implementation and an in-memory
//! implementation. Both uphold the same uniqueness and atomicity guarantees.

use chrono::{DateTime, Utc};
use companion_core::models::{
    Invitation, NewInvitation, NewReviewRequest, NewTemplate, NewUser, Organization, Ratings,
    ReviewRequest, ReviewRequestStatus, ReviewSubmission, Template, TemplateStatus, User,
};
use companion_core::AppError;
use uuid::Uuid;

/// First admin account created alongside its organization.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A review request whose target reports to the queried manager.
#[derive(Debug, Clone)]
pub struct ManagedReview {
    pub request: ReviewRequest,
    pub target: User,
    pub reviewer: User,
}

#[async_trait::async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Create the organization and its first admin in one transaction.
    async fn create_with_admin(
        &self,
        name: &str,
        admin: NewAccount,
    ) -> Result<(Organization, User), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, AppError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, AppError>;
}

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<User>, AppError>;

    /// User plus stored password hash, for sign-in.
    async fn find_credentials(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<(User, String)>, AppError>;

    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<User>, AppError>;

    /// Returns false when no such user existed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn set_manager(&self, id: Uuid, manager_id: Option<Uuid>)
        -> Result<Option<User>, AppError>;
}

#[async_trait::async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Standard templates in seed order.
    async fn list_standard(&self) -> Result<Vec<Template>, AppError>;

    /// Templates owned by the organization, most recent first.
    async fn list_by_organization(&self, organization_id: Uuid)
        -> Result<Vec<Template>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>, AppError>;

    async fn create(&self, template: NewTemplate) -> Result<Template, AppError>;

    async fn set_status(
        &self,
        id: Uuid,
        status: TemplateStatus,
    ) -> Result<Option<Template>, AppError>;

    /// The subset of `ids` that name principles of standard templates.
    async fn existing_standard_principles(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>;

    /// Most recently created published template of the organization.
    async fn latest_published(&self, organization_id: Uuid)
        -> Result<Option<Template>, AppError>;

    async fn count_standard(&self) -> Result<i64, AppError>;
}

#[async_trait::async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn create(&self, invitation: NewInvitation) -> Result<Invitation, AppError>;

    /// Invitations of the organization, newest first, optionally for one sender.
    async fn list(
        &self,
        organization_id: Uuid,
        sender_id: Option<Uuid>,
    ) -> Result<Vec<Invitation>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>, AppError>;

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>, AppError>;

    /// PENDING and unexpired -> REVOKED. `None` when the invitation was not claimable.
    async fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Invitation>, AppError>;

    /// Claim a PENDING, unexpired invitation and create its user atomically.
    ///
    /// `None` means another writer got there first (or the invitation is no longer
    /// pending); no user is created in that case.
    async fn accept(
        &self,
        id: Uuid,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<Option<(Invitation, User)>, AppError>;
}

#[async_trait::async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Fails with `AppError::Duplicate` if (target, reviewer, quarter) already exists.
    async fn create(&self, request: NewReviewRequest) -> Result<ReviewRequest, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ReviewRequest>, AppError>;

    async fn list_for_reviewer(
        &self,
        reviewer_id: Uuid,
        status: Option<ReviewRequestStatus>,
    ) -> Result<Vec<ReviewRequest>, AppError>;

    /// Requests whose target currently reports to `manager_id`.
    async fn list_for_manager(&self, manager_id: Uuid) -> Result<Vec<ManagedReview>, AppError>;

    /// PENDING -> COMPLETED plus the submission row, atomically.
    /// `None` when the request was not pending.
    async fn complete(
        &self,
        id: Uuid,
        ratings: Ratings,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewSubmission>, AppError>;

    /// PENDING -> DECLINED. `None` when the request was not pending.
    async fn decline(&self, id: Uuid) -> Result<Option<ReviewRequest>, AppError>;

    async fn find_submission(
        &self,
        review_request_id: Uuid,
    ) -> Result<Option<ReviewSubmission>, AppError>;
}
