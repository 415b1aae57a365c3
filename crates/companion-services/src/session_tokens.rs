//! Session tokens (HS256 JWT).

use chrono::{Duration, Utc};
use companion_core::models::{Role, User};
use companion_core::{AppError, SessionContext};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,      // user_id
    pub org: Uuid,      // organization_id
    pub role: String,   // "ADMIN", "MANAGER" or "EMPLOYEE"
    pub iat: i64,
    pub exp: i64,
}

/// A freshly authenticated user and the bearer token for their session.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("expiry", &self.expiry)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

impl SessionTokens {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id,
            org: user.organization_id,
            role: user.role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }

    /// Issue a token and bundle it with the user it was issued for.
    pub fn start_session(&self, user: User) -> Result<AuthenticatedSession, AppError> {
        let token = self.issue(&user)?;
        Ok(AuthenticatedSession { user, token })
    }

    pub fn verify(&self, token: &str) -> Result<SessionContext, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Session token validation failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Session has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid session token".to_string()),
            }
        })?;

        let role: Role = data
            .claims
            .role
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid user role".to_string()))?;

        Ok(SessionContext::new(data.claims.sub, data.claims.org, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            role,
            manager_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = SessionTokens::new(SECRET, 1);
        let user = user(Role::Manager);
        let ctx = tokens.verify(&tokens.issue(&user).unwrap()).unwrap();
        assert_eq!(ctx.user_id, user.id);
        assert_eq!(ctx.organization_id, user.organization_id);
        assert_eq!(ctx.role, Role::Manager);
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let issued = SessionTokens::new(SECRET, 1)
            .issue(&user(Role::Admin))
            .unwrap();
        let other = SessionTokens::new("another-secret-another-secret-xx", 1);
        assert!(matches!(
            other.verify(&issued),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = SessionTokens::new(SECRET, -1);
        let issued = tokens.issue(&user(Role::Employee)).unwrap();
        let err = tokens.verify(&issued).unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Session has expired");
    }
}
