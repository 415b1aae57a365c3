//! Policy constants shared across crates.

/// Lifetime of an invitation token, counted from issuance.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Prefix of the opaque invitation token handed to the issuer.
pub const INVITATION_TOKEN_PREFIX: &str = "inv_";

/// Random bytes behind each invitation token (hex encoded after the prefix).
pub const INVITATION_TOKEN_BYTES: usize = 32;

/// Minimum password length accepted at signup and redemption.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Inclusive bounds of a principle rating.
pub const MIN_RATING_SCORE: i32 = 1;
pub const MAX_RATING_SCORE: i32 = 5;

/// Upper bound on entries in a single invitation batch.
pub const MAX_INVITES_PER_BATCH: usize = 100;
