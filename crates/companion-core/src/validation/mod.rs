//! Input validation helpers

use validator::ValidateEmail;

use crate::constants::MIN_PASSWORD_LENGTH;
use crate::error::AppError;

/// Trim and lowercase an email address, rejecting malformed input.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.validate_email() {
        return Err(AppError::InvalidInput(format!(
            "Invalid email address: '{}'",
            raw.trim()
        )));
    }
    Ok(email)
}

/// Trimmed value of a required text field.
pub fn require_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be blank", field)));
    }
    Ok(trimmed.to_string())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Trim, drop blanks and de-duplicate tags while keeping their first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    out
}
