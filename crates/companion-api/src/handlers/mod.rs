//! HTTP handlers

pub mod auth;
pub mod health;
pub mod invitations;
pub mod reviews;
pub mod templates;
pub mod users;

use companion_core::AppError;
use uuid::Uuid;

/// Identifiers echoed by clients (`customerId`, `senderId`, `requesterId`) must agree
/// with the session.
pub(crate) fn ensure_matches(
    field: &str,
    supplied: Option<Uuid>,
    actual: Uuid,
) -> Result<(), AppError> {
    match supplied {
        Some(id) if id != actual => Err(AppError::Forbidden(format!(
            "{} does not match the signed-in session",
            field
        ))),
        _ => Ok(()),
    }
}
