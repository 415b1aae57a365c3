use async_trait::async_trait;
use chrono::{DateTime, Utc};
use companion_core::models::{Invitation, InvitationStatus, NewInvitation, NewUser, User};
use companion_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{db_error, USER_COLUMNS};
use crate::db::traits::InvitationRepository;

const INVITATION_COLUMNS: &str =
    "id, organization_id, sender_id, email, role, status, expires_at, created_at, accepted_at";

#[derive(Clone)]
pub struct PostgresInvitationRepository {
    pool: PgPool,
}

impl PostgresInvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationRepository for PostgresInvitationRepository {
    #[tracing::instrument(skip(self, invitation), fields(db.table = "invitations", db.operation = "insert"))]
    async fn create(&self, invitation: NewInvitation) -> Result<Invitation, AppError> {
        let created = sqlx::query_as::<Postgres, Invitation>(&format!(
            r#"
            INSERT INTO invitations (id, organization_id, sender_id, email, role, token_hash, status, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(invitation.organization_id)
        .bind(invitation.sender_id)
        .bind(&invitation.email)
        .bind(invitation.role)
        .bind(&invitation.token_hash)
        .bind(InvitationStatus::Pending)
        .bind(invitation.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create invitation"))?;

        tracing::info!(
            invitation_id = %created.id,
            organization_id = %created.organization_id,
            sender_id = %created.sender_id,
            role = %created.role,
            "Invitation issued"
        );

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "select"))]
    async fn list(
        &self,
        organization_id: Uuid,
        sender_id: Option<Uuid>,
    ) -> Result<Vec<Invitation>, AppError> {
        sqlx::query_as::<Postgres, Invitation>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE organization_id = $1 AND ($2::uuid IS NULL OR sender_id = $2)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(organization_id)
        .bind(sender_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list invitations"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>, AppError> {
        sqlx::query_as::<Postgres, Invitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get invitation"))
    }

    #[tracing::instrument(skip(self, token_hash), fields(db.table = "invitations", db.operation = "select"))]
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>, AppError> {
        sqlx::query_as::<Postgres, Invitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get invitation by token"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "update"))]
    async fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Invitation>, AppError> {
        let revoked = sqlx::query_as::<Postgres, Invitation>(&format!(
            r#"
            UPDATE invitations
            SET status = 'REVOKED'
            WHERE id = $1 AND status = 'PENDING' AND expires_at > $2
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("revoke invitation"))?;

        if let Some(ref invitation) = revoked {
            tracing::info!(invitation_id = %invitation.id, "Invitation revoked");
        }

        Ok(revoked)
    }

    #[tracing::instrument(skip(self, user), fields(db.table = "invitations", db.operation = "update"))]
    async fn accept(
        &self,
        id: Uuid,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<Option<(Invitation, User)>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin redemption transaction"))?;

        // The conditional update is the claim: a concurrent redeemer matches zero rows.
        let claimed = sqlx::query_as::<Postgres, Invitation>(&format!(
            r#"
            UPDATE invitations
            SET status = 'ACCEPTED', accepted_at = $2
            WHERE id = $1 AND status = 'PENDING' AND expires_at > $2
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("claim invitation"))?;

        let Some(invitation) = claimed else {
            tx.rollback()
                .await
                .map_err(db_error("rollback redemption transaction"))?;
            return Ok(None);
        };

        let created = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            INSERT INTO users (id, organization_id, name, email, role, manager_id, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user.organization_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.manager_id)
        .bind(&user.password_hash)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Duplicate(_) => AppError::Duplicate(format!(
                "A member with email '{}' already exists",
                user.email
            )),
            other => {
                tracing::error!(error = %other, "Failed to create invited user");
                other
            }
        })?;

        tx.commit()
            .await
            .map_err(db_error("commit redemption transaction"))?;

        tracing::info!(
            invitation_id = %invitation.id,
            user_id = %created.id,
            organization_id = %created.organization_id,
            "Invitation accepted"
        );

        Ok(Some((invitation, created)))
    }
}
