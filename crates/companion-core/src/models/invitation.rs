use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Role;

/// Invitation lifecycle.
///
/// Only `Pending`, `Accepted` and `Revoked` are ever written. `Expired` is derived
/// at read time from `expires_at`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "invitation_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub sender_id: Uuid,
    pub email: String,
    pub role: Role,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Status as observed at `now`: a pending invitation past its expiry reads as expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        match self.status {
            InvitationStatus::Pending if now >= self.expires_at => InvitationStatus::Expired,
            status => status,
        }
    }

    /// Copy with `status` replaced by the effective status at `now`.
    pub fn observed_at(mut self, now: DateTime<Utc>) -> Self {
        self.status = self.effective_status(now);
        self
    }
}

/// Invitation row to insert. Only the digest of the token is stored.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub organization_id: Uuid,
    pub sender_id: Uuid,
    pub email: String,
    pub role: Role,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invitation(status: InvitationStatus, expires_at: DateTime<Utc>) -> Invitation {
        Invitation {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            role: Role::Employee,
            status,
            expires_at,
            created_at: Utc::now(),
            accepted_at: None,
        }
    }

    #[test]
    fn test_pending_past_expiry_reads_expired() {
        let now = Utc::now();
        let inv = invitation(InvitationStatus::Pending, now - Duration::seconds(1));
        assert_eq!(inv.effective_status(now), InvitationStatus::Expired);
    }

    #[test]
    fn test_pending_before_expiry_stays_pending() {
        let now = Utc::now();
        let inv = invitation(InvitationStatus::Pending, now + Duration::days(1));
        assert_eq!(inv.effective_status(now), InvitationStatus::Pending);
    }

    #[test]
    fn test_terminal_states_ignore_expiry() {
        let now = Utc::now();
        let past = now - Duration::days(30);
        assert_eq!(
            invitation(InvitationStatus::Accepted, past).effective_status(now),
            InvitationStatus::Accepted
        );
        assert_eq!(
            invitation(InvitationStatus::Revoked, past).effective_status(now),
            InvitationStatus::Revoked
        );
    }
}
