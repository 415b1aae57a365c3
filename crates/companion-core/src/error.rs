//! Error types module
//!
//! This module provides the error taxonomy shared by every Companion component.
//! All failures are unified under the `AppError` enum: malformed input, stale
//! references, illegal state transitions, constraint violations and the
//! invitation-specific outcomes each have their own variant so that clients can
//! render distinct guidance for them.
//!
//! The `Database` variant carries a `sqlx::Error` when the `sqlx` feature is on.
//! Without it the variant holds a plain message.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected but well-formed requests
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DUPLICATE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Invitation expired")]
    InvitationExpired,

    #[error("Invitation revoked")]
    InvitationRevoked,

    #[error("Invitation already used")]
    InvitationAlreadyUsed,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        if let SqlxError::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                return AppError::Duplicate(format!("Record violates {}", constraint));
            }
        }
        AppError::Database(err)
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Refresh and verify the resource still exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidState(_) => (
            409,
            "INVALID_STATE",
            false,
            Some("Refresh to see the current state before retrying"),
            false,
            LogLevel::Debug,
        ),
        AppError::Duplicate(_) => (
            409,
            "DUPLICATE",
            false,
            Some("The record already exists; no action is needed"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvitationExpired => (
            410,
            "INVITATION_EXPIRED",
            false,
            Some("Ask the sender to issue a new invitation"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvitationRevoked => (
            410,
            "INVITATION_REVOKED",
            false,
            Some("Contact your organization administrator"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvitationAlreadyUsed => (
            409,
            "INVITATION_ALREADY_USED",
            false,
            Some("Sign in with the account created from this invitation"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Sign in again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            Some("Ask an administrator for access"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::InvalidInput(_) => "ValidationError",
            AppError::NotFound(_) => "NotFoundError",
            AppError::InvalidState(_) => "StateError",
            AppError::Duplicate(_) => "DuplicateError",
            AppError::InvitationExpired => "ExpiredError",
            AppError::InvitationRevoked => "RevokedError",
            AppError::InvitationAlreadyUsed => "AlreadyUsedError",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::InvalidState(ref msg) => msg.clone(),
            AppError::Duplicate(ref msg) => msg.clone(),
            AppError::InvitationExpired => "This invitation has expired".to_string(),
            AppError::InvitationRevoked => "This invitation has been revoked".to_string(),
            AppError::InvitationAlreadyUsed => {
                "This invitation has already been accepted".to_string()
            }
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access database");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("Template not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Template not found");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_invitation_outcomes_are_distinct() {
        let expired = AppError::InvitationExpired;
        let revoked = AppError::InvitationRevoked;
        let used = AppError::InvitationAlreadyUsed;

        assert_eq!(expired.http_status_code(), 410);
        assert_eq!(revoked.http_status_code(), 410);
        assert_eq!(used.http_status_code(), 409);

        assert_ne!(expired.error_code(), revoked.error_code());
        assert_ne!(revoked.error_code(), used.error_code());
        assert_ne!(expired.suggested_action(), revoked.suggested_action());
    }

    #[test]
    fn test_state_and_duplicate_are_conflicts() {
        let state = AppError::InvalidState("Review already completed".to_string());
        let dup = AppError::Duplicate("Review already requested".to_string());
        assert_eq!(state.http_status_code(), 409);
        assert_eq!(dup.http_status_code(), 409);
        assert_eq!(state.error_type(), "StateError");
        assert_eq!(dup.error_type(), "DuplicateError");
    }

    #[test]
    fn test_forbidden_logs_at_warn() {
        let err = AppError::Forbidden("Admins only".to_string());
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert_eq!(err.client_message(), "Admins only");
    }

    #[test]
    fn test_internal_message_stays_out_of_client_view() {
        let err = AppError::Internal("token signing failed".to_string());
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_sensitive());
        assert!(err.detailed_message().contains("token signing failed"));
    }
}
