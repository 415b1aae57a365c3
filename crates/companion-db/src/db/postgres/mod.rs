//! PostgreSQL repositories

mod invitation;
mod organization;
mod review;
mod template;
mod user;

pub use invitation::PostgresInvitationRepository;
pub use organization::PostgresOrganizationRepository;
pub use review::PostgresReviewRepository;
pub use template::PostgresTemplateRepository;
pub use user::PostgresUserRepository;

pub(crate) const USER_COLUMNS: &str =
    "id, organization_id, name, email, role, manager_id, created_at";

/// Log a failed query and convert it, keeping unique violations distinguishable.
pub(crate) fn db_error(operation: &'static str) -> impl Fn(sqlx::Error) -> companion_core::AppError {
    move |e| {
        tracing::error!(error = %e, operation, "Database query failed");
        companion_core::AppError::from(e)
    }
}
