//! Password hashing and invitation token helpers.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use companion_core::constants::{INVITATION_TOKEN_BYTES, INVITATION_TOKEN_PREFIX};
use companion_core::AppError;
use rand_core::OsRng;
use sha2::{Digest, Sha256};

/// Hash a password for storage (Argon2, PHC string).
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate an unguessable invitation token.
pub fn generate_invitation_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..INVITATION_TOKEN_BYTES).map(|_| rng.random()).collect();

    // Format: inv_<64 hex chars>
    format!("{}{}", INVITATION_TOKEN_PREFIX, hex::encode(random_bytes))
}

/// Digest stored in place of the raw token.
///
/// Tokens carry 256 bits of entropy, so an unsalted SHA-256 is enough and keeps
/// lookups by token a single indexed equality.
pub fn hash_invitation_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.trim().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_invitation_token() {
        let token = generate_invitation_token();
        assert!(token.starts_with("inv_"));
        assert_eq!(token.len(), 4 + 64);
        assert_ne!(token, generate_invitation_token());
    }

    #[test]
    fn test_token_hash_is_stable() {
        let token = generate_invitation_token();
        assert_eq!(hash_invitation_token(&token), hash_invitation_token(&token));
        assert_ne!(hash_invitation_token(&token), token);
        assert_eq!(hash_invitation_token(&token).len(), 64);
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }
}
