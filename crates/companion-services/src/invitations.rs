//! Invitation manager: issue, list, revoke and redeem organization invitations.

use chrono::{Duration, Utc};
use companion_core::constants::{INVITATION_TTL_DAYS, MAX_INVITES_PER_BATCH};
use companion_core::models::{Invitation, InvitationStatus, NewInvitation, NewUser, Role};
use companion_core::validation::{normalize_email, require_text, validate_password};
use companion_core::{AppError, SessionContext};
use companion_db::{InvitationRepository, UserRepository};
use std::sync::Arc;
use uuid::Uuid;

use crate::credentials::{generate_invitation_token, hash_invitation_token, hash_password};
use crate::notifier::InvitationNotifier;
use crate::session_tokens::{AuthenticatedSession, SessionTokens};

#[derive(Debug, Clone)]
pub struct InviteEntry {
    pub email: String,
    pub role: Role,
}

#[derive(Debug)]
pub enum InviteOutcome {
    /// The raw token is only ever available here.
    Issued { invitation: Invitation, token: String },
    Failed { email: String, error: AppError },
}

impl InviteOutcome {
    pub fn is_issued(&self) -> bool {
        matches!(self, InviteOutcome::Issued { .. })
    }
}

/// Per-entry results of a batch, in request order.
#[derive(Debug, Default)]
pub struct IssueReport {
    pub outcomes: Vec<InviteOutcome>,
}

impl IssueReport {
    pub fn issued_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_issued()).count()
    }
}

fn redemption_error(status: InvitationStatus) -> AppError {
    match status {
        InvitationStatus::Expired => AppError::InvitationExpired,
        InvitationStatus::Revoked => AppError::InvitationRevoked,
        InvitationStatus::Accepted | InvitationStatus::Pending => AppError::InvitationAlreadyUsed,
    }
}

#[derive(Clone)]
pub struct InvitationService {
    invitations: Arc<dyn InvitationRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn InvitationNotifier>,
    tokens: SessionTokens,
}

impl InvitationService {
    pub fn new(
        invitations: Arc<dyn InvitationRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn InvitationNotifier>,
        tokens: SessionTokens,
    ) -> Self {
        Self {
            invitations,
            users,
            notifier,
            tokens,
        }
    }

    /// Issue one invitation per entry. Entries fail independently.
    #[tracing::instrument(skip(self, ctx, entries), fields(sender_id = %ctx.user_id, count = entries.len()))]
    pub async fn issue(
        &self,
        ctx: &SessionContext,
        entries: Vec<InviteEntry>,
    ) -> Result<IssueReport, AppError> {
        ctx.require_people_manager()?;
        if entries.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one invitation is required".to_string(),
            ));
        }
        if entries.len() > MAX_INVITES_PER_BATCH {
            return Err(AppError::InvalidInput(format!(
                "At most {} invitations can be sent at once",
                MAX_INVITES_PER_BATCH
            )));
        }

        let mut report = IssueReport::default();
        for entry in entries {
            let outcome = match self.issue_one(ctx, &entry).await {
                Ok((invitation, token)) => InviteOutcome::Issued { invitation, token },
                Err(error) => {
                    tracing::debug!(error = %error, "Invitation entry rejected");
                    InviteOutcome::Failed {
                        email: entry.email,
                        error,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    async fn issue_one(
        &self,
        ctx: &SessionContext,
        entry: &InviteEntry,
    ) -> Result<(Invitation, String), AppError> {
        let email = normalize_email(&entry.email)?;
        if entry.role == Role::Admin && !ctx.is_admin() {
            return Err(AppError::Forbidden(
                "Managers cannot invite admins".to_string(),
            ));
        }
        if self
            .users
            .find_by_email(ctx.organization_id, &email)
            .await?
            .is_some()
        {
            return Err(AppError::Duplicate(format!(
                "'{}' is already a member of this organization",
                email
            )));
        }

        let token = generate_invitation_token();
        let invitation = self
            .invitations
            .create(NewInvitation {
                organization_id: ctx.organization_id,
                sender_id: ctx.user_id,
                email,
                role: entry.role,
                token_hash: hash_invitation_token(&token),
                expires_at: Utc::now() + Duration::days(INVITATION_TTL_DAYS),
            })
            .await?;

        if let Err(e) = self.notifier.invitation_issued(&invitation, &token).await {
            tracing::warn!(
                invitation_id = %invitation.id,
                error = %e,
                "Failed to deliver invitation"
            );
        }

        Ok((invitation, token))
    }

    /// Invitations of the organization with their status as observed now.
    ///
    /// Managers only ever see their own invitations.
    pub async fn list(
        &self,
        ctx: &SessionContext,
        organization_id: Uuid,
        sender_id: Option<Uuid>,
    ) -> Result<Vec<Invitation>, AppError> {
        ctx.require_organization(organization_id)?;
        ctx.require_people_manager()?;

        let sender_id = if ctx.is_admin() {
            sender_id
        } else {
            match sender_id {
                Some(id) if id != ctx.user_id => {
                    return Err(AppError::Forbidden(
                        "Managers can only list their own invitations".to_string(),
                    ));
                }
                _ => Some(ctx.user_id),
            }
        };

        let now = Utc::now();
        Ok(self
            .invitations
            .list(organization_id, sender_id)
            .await?
            .into_iter()
            .map(|i| i.observed_at(now))
            .collect())
    }

    /// PENDING -> REVOKED.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn revoke(
        &self,
        ctx: &SessionContext,
        invitation_id: Uuid,
    ) -> Result<Invitation, AppError> {
        ctx.require_people_manager()?;

        let invitation = self
            .invitations
            .find_by_id(invitation_id)
            .await?
            .filter(|i| i.organization_id == ctx.organization_id)
            .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

        if !ctx.is_admin() && invitation.sender_id != ctx.user_id {
            return Err(AppError::Forbidden(
                "Managers can only revoke their own invitations".to_string(),
            ));
        }

        let now = Utc::now();
        let status = invitation.effective_status(now);
        if status != InvitationStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Invitation is {} and can no longer be revoked",
                status_label(status)
            )));
        }

        self.invitations
            .revoke(invitation_id, now)
            .await?
            .map(|i| i.observed_at(now))
            .ok_or_else(|| {
                AppError::InvalidState("Invitation is no longer pending".to_string())
            })
    }

    /// Exchange a token for a new account and a session.
    ///
    /// Concurrent redemptions of the same token resolve to exactly one account; the
    /// losers see `InvitationAlreadyUsed`.
    #[tracing::instrument(skip_all)]
    pub async fn redeem(
        &self,
        token: &str,
        name: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, AppError> {
        let token_hash = hash_invitation_token(token.trim());
        let invitation = self
            .invitations
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

        let now = Utc::now();
        let status = invitation.effective_status(now);
        if status != InvitationStatus::Pending {
            return Err(redemption_error(status));
        }

        let name = require_text("Name", name)?;
        validate_password(password)?;

        let manager_id = match self.users.find_by_id(invitation.sender_id).await? {
            Some(sender) if sender.role == Role::Manager => Some(sender.id),
            _ => None,
        };

        let new_user = NewUser {
            organization_id: invitation.organization_id,
            name,
            email: invitation.email.clone(),
            role: invitation.role,
            manager_id,
            password_hash: hash_password(password)?,
        };

        let Some((accepted, user)) = self.invitations.accept(invitation.id, new_user, now).await?
        else {
            let status = self
                .invitations
                .find_by_id(invitation.id)
                .await?
                .map(|i| i.effective_status(Utc::now()))
                .unwrap_or(InvitationStatus::Accepted);
            return Err(redemption_error(status));
        };

        tracing::info!(
            invitation_id = %accepted.id,
            user_id = %user.id,
            organization_id = %user.organization_id,
            "Invitation accepted"
        );

        self.tokens.start_session(user)
    }
}

fn status_label(status: InvitationStatus) -> &'static str {
    match status {
        InvitationStatus::Pending => "pending",
        InvitationStatus::Accepted => "already accepted",
        InvitationStatus::Revoked => "already revoked",
        InvitationStatus::Expired => "expired",
    }
}
