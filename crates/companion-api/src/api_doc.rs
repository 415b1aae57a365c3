//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use companion_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Companion API",
        version = "0.1.0",
        description = "Multi-tenant performance reviews: principle templates, invitations and quarterly review requests"
    ),
    paths(
        handlers::auth::signup_org,
        handlers::auth::login,
        handlers::auth::accept_invitation,
        handlers::auth::me,
        handlers::invitations::issue_invitations,
        handlers::invitations::list_invitations,
        handlers::invitations::revoke_invitation,
        handlers::users::list_users,
        handlers::users::delete_user,
        handlers::users::assign_manager,
        handlers::templates::list_standard,
        handlers::templates::list_custom,
        handlers::templates::create_custom,
        handlers::templates::publish,
        handlers::templates::active_principles,
        handlers::reviews::request_review,
        handlers::reviews::list_reviewer_requests,
        handlers::reviews::submit_review,
        handlers::reviews::get_submission,
        handlers::reviews::decline_review,
        handlers::reviews::manager_dashboard,
    ),
    components(
        schemas(
            // Accounts
            models::Role,
            models::User,
            models::UserSummary,
            handlers::auth::SignupRequest,
            handlers::auth::SignupResponse,
            handlers::auth::SessionData,
            handlers::auth::LoginRequest,
            handlers::auth::LoginResponse,
            handlers::auth::AcceptInvitationRequest,
            handlers::users::AssignManagerRequest,
            // Invitations
            models::Invitation,
            models::InvitationStatus,
            handlers::invitations::InviteRequestEntry,
            handlers::invitations::IssueInvitationsRequest,
            handlers::invitations::InviteResultStatus,
            handlers::invitations::InviteResult,
            handlers::invitations::IssueInvitationsResponse,
            // Templates
            models::Template,
            models::TemplateStatus,
            models::Principle,
            models::PrincipleDraft,
            models::SourceKind,
            handlers::templates::CreateTemplateRequest,
            // Reviews
            models::Quarter,
            models::ReviewRequest,
            models::ReviewRequestStatus,
            models::Rating,
            models::ReviewSubmission,
            models::DashboardStatus,
            models::DashboardEntry,
            models::ManagerDashboard,
            handlers::reviews::RequestReviewRequest,
            handlers::reviews::SubmitReviewRequest,
            // Error
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "auth", description = "Organization signup, login and invitation redemption"),
        (name = "invitations", description = "Issuing, listing and revoking invitations"),
        (name = "users", description = "Organization roster and reporting lines"),
        (name = "templates", description = "Standard and custom principle templates"),
        (name = "reviews", description = "Quarterly review requests, submissions and dashboards")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_review_paths() {
        let doc = get_openapi_spec();
        assert!(doc.paths.paths.contains_key("/api/reviews/requests"));
        assert!(doc
            .paths
            .paths
            .contains_key("/api/templates/{id}/publish"));
    }
}
