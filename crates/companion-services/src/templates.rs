//! Template store: standard seed templates and organization-authored custom templates.

use companion_core::models::{
    NewPrinciple, NewTemplate, Principle, PrincipleDraft, SourceKind, Template, TemplateStatus,
};
use companion_core::validation::{normalize_tags, require_text};
use companion_core::{AppError, SessionContext};
use companion_db::TemplateRepository;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Content of a custom template to create.
#[derive(Debug, Clone)]
pub struct CreateTemplate {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub principles: Vec<PrincipleDraft>,
    pub status: TemplateStatus,
}

#[derive(Clone)]
pub struct TemplateService {
    templates: Arc<dyn TemplateRepository>,
}

impl TemplateService {
    pub fn new(templates: Arc<dyn TemplateRepository>) -> Self {
        Self { templates }
    }

    pub async fn list_standard(&self) -> Result<Vec<Template>, AppError> {
        self.templates.list_standard().await
    }

    /// Drafts and published templates of the caller's organization, newest first.
    pub async fn list_for_organization(
        &self,
        ctx: &SessionContext,
        organization_id: Uuid,
    ) -> Result<Vec<Template>, AppError> {
        ctx.require_organization(organization_id)?;
        self.templates.list_by_organization(organization_id).await
    }

    /// Persist a custom template. Principles are copied by value under fresh ids.
    #[tracing::instrument(skip(self, ctx, request), fields(user_id = %ctx.user_id))]
    pub async fn create_custom(
        &self,
        ctx: &SessionContext,
        organization_id: Uuid,
        request: CreateTemplate,
    ) -> Result<Template, AppError> {
        ctx.require_organization(organization_id)?;
        ctx.require_admin()?;

        let name = require_text("Template name", &request.name)?;
        if request.principles.is_empty() {
            return Err(AppError::InvalidInput(
                "A template needs at least one principle".to_string(),
            ));
        }

        let mut principles = Vec::with_capacity(request.principles.len());
        for draft in &request.principles {
            principles.push(NewPrinciple {
                id: Uuid::new_v4(),
                title: require_text("Principle title", &draft.title)?,
                description: draft.description.trim().to_string(),
                source_kind: SourceKind::Custom,
                original_principle_id: draft.original_principle_id,
            });
        }

        let referenced: Vec<Uuid> = principles
            .iter()
            .filter_map(|p| p.original_principle_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if !referenced.is_empty() {
            let known: HashSet<Uuid> = self
                .templates
                .existing_standard_principles(&referenced)
                .await?
                .into_iter()
                .collect();
            if let Some(missing) = referenced.iter().find(|id| !known.contains(id)) {
                return Err(AppError::InvalidInput(format!(
                    "originalPrincipleId {} does not reference a standard principle",
                    missing
                )));
            }
        }

        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        self.templates
            .create(NewTemplate {
                organization_id: Some(organization_id),
                name,
                description,
                status: request.status,
                tags: normalize_tags(&request.tags),
                principles,
            })
            .await
    }

    /// DRAFT -> PUBLISHED. Publishing an already published template is a no-op.
    #[tracing::instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn publish(
        &self,
        ctx: &SessionContext,
        template_id: Uuid,
    ) -> Result<Template, AppError> {
        let template = self
            .templates
            .find_by_id(template_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

        let Some(owner) = template.organization_id else {
            return Err(AppError::Forbidden(
                "Standard templates are read-only".to_string(),
            ));
        };
        if owner != ctx.organization_id {
            return Err(AppError::NotFound("Template not found".to_string()));
        }
        ctx.require_admin()?;

        if template.status == TemplateStatus::Published {
            tracing::debug!(template_id = %template_id, "Template already published");
            return Ok(template);
        }

        let published = self
            .templates
            .set_status(template_id, TemplateStatus::Published)
            .await?
            .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

        tracing::info!(template_id = %template_id, "Template published");
        Ok(published)
    }

    /// Principles of the organization's most recently created published template.
    pub async fn active_principles(
        &self,
        ctx: &SessionContext,
        organization_id: Uuid,
    ) -> Result<Vec<Principle>, AppError> {
        ctx.require_organization(organization_id)?;
        Ok(self
            .templates
            .latest_published(organization_id)
            .await?
            .map(|t| t.principles)
            .unwrap_or_default())
    }
}
