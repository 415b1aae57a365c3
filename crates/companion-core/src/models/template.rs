use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Visibility lifecycle of a template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "template_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemplateStatus {
    Draft,
    Published,
}

/// Where a principle came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "principle_source", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Standard,
    Custom,
}

/// A titled behavioral statement, ratable 1-5 in a review.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Principle {
    pub id: Uuid,
    #[serde(skip)]
    pub template_id: Uuid,
    pub title: String,
    pub description: String,
    pub source_kind: SourceKind,
    /// Standard principle this one was forked from. Lookup only.
    pub original_principle_id: Option<Uuid>,
    #[serde(skip)]
    pub position: i32,
}

/// A named, ordered set of principles.
///
/// `organization_id == None` marks a standard template.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub status: TemplateStatus,
    pub tags: Vec<String>,
    pub principles: Vec<Principle>,
    pub created_at: DateTime<Utc>,
}

impl Template {
    pub fn is_standard(&self) -> bool {
        self.organization_id.is_none()
    }
}

/// Principle content supplied when authoring a custom template.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrincipleDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub original_principle_id: Option<Uuid>,
}

/// A fully validated template ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub status: TemplateStatus,
    pub tags: Vec<String>,
    pub principles: Vec<NewPrinciple>,
}

/// Principle row to insert. Identity is assigned by the caller.
#[derive(Debug, Clone)]
pub struct NewPrinciple {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub source_kind: SourceKind,
    pub original_principle_id: Option<Uuid>,
}
