use async_trait::async_trait;
use chrono::{DateTime, Utc};
use companion_core::models::{NewTemplate, Principle, SourceKind, Template, TemplateStatus};
use companion_core::AppError;
use sqlx::{FromRow, PgPool, Postgres};
use std::collections::HashMap;
use uuid::Uuid;

use super::db_error;
use crate::db::traits::TemplateRepository;

const TEMPLATE_COLUMNS: &str = "id, organization_id, name, description, status, tags, created_at";

#[derive(FromRow)]
struct TemplateRow {
    id: Uuid,
    organization_id: Option<Uuid>,
    name: String,
    description: Option<String>,
    status: TemplateStatus,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TemplateRow {
    fn into_template(self, principles: Vec<Principle>) -> Template {
        Template {
            id: self.id,
            organization_id: self.organization_id,
            name: self.name,
            description: self.description,
            status: self.status,
            tags: self.tags,
            principles,
            created_at: self.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load principles for all rows in one query and assemble templates in row order.
    async fn attach_principles(&self, rows: Vec<TemplateRow>) -> Result<Vec<Template>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let principles = sqlx::query_as::<Postgres, Principle>(
            r#"
            SELECT id, template_id, title, description, source_kind, original_principle_id, position
            FROM principles
            WHERE template_id = ANY($1)
            ORDER BY template_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list principles"))?;

        let mut by_template: HashMap<Uuid, Vec<Principle>> = HashMap::new();
        for principle in principles {
            by_template
                .entry(principle.template_id)
                .or_default()
                .push(principle);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let principles = by_template.remove(&row.id).unwrap_or_default();
                row.into_template(principles)
            })
            .collect())
    }

    async fn fetch_one_with_principles(
        &self,
        row: Option<TemplateRow>,
    ) -> Result<Option<Template>, AppError> {
        match row {
            Some(row) => Ok(self.attach_principles(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    #[tracing::instrument(skip(self), fields(db.table = "templates", db.operation = "select"))]
    async fn list_standard(&self) -> Result<Vec<Template>, AppError> {
        let rows = sqlx::query_as::<Postgres, TemplateRow>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM templates
            WHERE organization_id IS NULL AND status = 'PUBLISHED'
            ORDER BY created_at ASC, name ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list standard templates"))?;

        self.attach_principles(rows).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "templates", db.operation = "select"))]
    async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Template>, AppError> {
        let rows = sqlx::query_as::<Postgres, TemplateRow>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM templates
            WHERE organization_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list organization templates"))?;

        self.attach_principles(rows).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "templates", db.operation = "select"))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>, AppError> {
        let row = sqlx::query_as::<Postgres, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get template"))?;

        self.fetch_one_with_principles(row).await
    }

    #[tracing::instrument(skip(self, template), fields(db.table = "templates", db.operation = "insert"))]
    async fn create(&self, template: NewTemplate) -> Result<Template, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin template transaction"))?;

        let row = sqlx::query_as::<Postgres, TemplateRow>(&format!(
            r#"
            INSERT INTO templates (id, organization_id, name, description, status, tags, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(template.organization_id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.status)
        .bind(&template.tags)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("create template"))?;

        let mut principles = Vec::with_capacity(template.principles.len());
        for (position, principle) in template.principles.iter().enumerate() {
            let inserted = sqlx::query_as::<Postgres, Principle>(
                r#"
                INSERT INTO principles (id, template_id, title, description, source_kind, original_principle_id, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, template_id, title, description, source_kind, original_principle_id, position
                "#,
            )
            .bind(principle.id)
            .bind(row.id)
            .bind(&principle.title)
            .bind(&principle.description)
            .bind(principle.source_kind)
            .bind(principle.original_principle_id)
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("create principle"))?;
            principles.push(inserted);
        }

        tx.commit()
            .await
            .map_err(db_error("commit template transaction"))?;

        let created = row.into_template(principles);
        tracing::info!(
            template_id = %created.id,
            organization_id = ?created.organization_id,
            principle_count = created.principles.len(),
            status = ?created.status,
            "Template created"
        );

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "templates", db.operation = "update"))]
    async fn set_status(
        &self,
        id: Uuid,
        status: TemplateStatus,
    ) -> Result<Option<Template>, AppError> {
        let row = sqlx::query_as::<Postgres, TemplateRow>(&format!(
            "UPDATE templates SET status = $2 WHERE id = $1 RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update template status"))?;

        self.fetch_one_with_principles(row).await
    }

    #[tracing::instrument(skip(self, ids), fields(db.table = "principles", db.operation = "select"))]
    async fn existing_standard_principles(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            SELECT p.id
            FROM principles p
            JOIN templates t ON t.id = p.template_id
            WHERE p.id = ANY($1) AND t.organization_id IS NULL AND p.source_kind = $2
            "#,
        )
        .bind(ids)
        .bind(SourceKind::Standard)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("check standard principles"))
    }

    #[tracing::instrument(skip(self), fields(db.table = "templates", db.operation = "select"))]
    async fn latest_published(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Template>, AppError> {
        let row = sqlx::query_as::<Postgres, TemplateRow>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS}
            FROM templates
            WHERE organization_id = $1 AND status = 'PUBLISHED'
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get latest published template"))?;

        self.fetch_one_with_principles(row).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "templates", db.operation = "select"))]
    async fn count_standard(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM templates WHERE organization_id IS NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("count standard templates"))
    }
}
