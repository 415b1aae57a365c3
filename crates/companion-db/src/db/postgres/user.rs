use async_trait::async_trait;
use companion_core::models::User;
use companion_core::AppError;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use super::{db_error, USER_COLUMNS};
use crate::db::traits::UserRepository;

#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get user"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn find_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE organization_id = $1 AND LOWER(email) = LOWER($2)"
        ))
        .bind(organization_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get user by email"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn find_credentials(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query_as::<Postgres, CredentialRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}, password_hash
            FROM users
            WHERE organization_id = $1 AND LOWER(email) = LOWER($2)
            "#
        ))
        .bind(organization_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get user credentials"))?;

        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE organization_id = $1 ORDER BY LOWER(name), created_at"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list users"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "delete"))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete user"))?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(user_id = %id, "User deleted");
        }
        Ok(deleted)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update"))]
    async fn set_manager(
        &self,
        id: Uuid,
        manager_id: Option<Uuid>,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<Postgres, User>(&format!(
            "UPDATE users SET manager_id = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(manager_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("assign manager"))
    }
}
