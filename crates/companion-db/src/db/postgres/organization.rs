use async_trait::async_trait;
use chrono::Utc;
use companion_core::models::{Organization, Role, User};
use companion_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{db_error, USER_COLUMNS};
use crate::db::traits::{NewAccount, OrganizationRepository};

#[derive(Clone)]
pub struct PostgresOrganizationRepository {
    pool: PgPool,
}

impl PostgresOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PostgresOrganizationRepository {
    #[tracing::instrument(skip(self, admin), fields(db.table = "organizations", db.operation = "insert"))]
    async fn create_with_admin(
        &self,
        name: &str,
        admin: NewAccount,
    ) -> Result<(Organization, User), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin signup transaction"))?;

        let now = Utc::now();
        let organization = sqlx::query_as::<Postgres, Organization>(
            r#"
            INSERT INTO organizations (id, name, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Duplicate(_) => {
                AppError::Duplicate(format!("Organization '{}' already exists", name))
            }
            other => {
                tracing::error!(error = %other, "Failed to create organization");
                other
            }
        })?;

        let user = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            INSERT INTO users (id, organization_id, name, email, role, manager_id, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, NULL, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(organization.id)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(Role::Admin)
        .bind(&admin.password_hash)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("create organization admin"))?;

        tx.commit()
            .await
            .map_err(db_error("commit signup transaction"))?;

        tracing::info!(
            organization_id = %organization.id,
            admin_id = %user.id,
            "Organization created"
        );

        Ok((organization, user))
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        sqlx::query_as::<Postgres, Organization>(
            "SELECT id, name, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get organization"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select"))]
    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, AppError> {
        sqlx::query_as::<Postgres, Organization>(
            "SELECT id, name, created_at FROM organizations WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get organization by name"))
    }
}
