//! Principle selector: a single-user working set built before a template is committed.
//!
//! Standard principles are forked by value. The fork keeps a back-reference to its
//! source through `original_id` and never shares state with it, so edits only ever
//! touch the copy.

use companion_core::models::{
    Principle, PrincipleDraft, SourceKind, Template, TemplateStatus,
};
use companion_core::{AppError, SessionContext};
use uuid::Uuid;

use crate::templates::{CreateTemplate, TemplateService};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPrinciple {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub source: SourceKind,
    pub original_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipleSelector {
    entries: Vec<SelectedPrinciple>,
}

impl PrincipleSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SelectedPrinciple] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_forked(&self, principle_id: Uuid) -> bool {
        self.entries
            .iter()
            .any(|e| e.original_id == Some(principle_id))
    }

    /// Toggle a fork of `principle`. Returns whether it is selected afterwards.
    pub fn fork_standard(&mut self, principle: &Principle) -> bool {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.original_id == Some(principle.id))
        {
            self.entries.remove(pos);
            return false;
        }

        self.entries.push(SelectedPrinciple {
            id: Uuid::new_v4(),
            title: principle.title.clone(),
            description: principle.description.clone(),
            source: SourceKind::Standard,
            original_id: Some(principle.id),
        });
        true
    }

    /// Append an authored principle. A blank title is ignored and yields `None`.
    pub fn add_custom(&mut self, title: &str, description: &str) -> Option<Uuid> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        let id = Uuid::new_v4();
        self.entries.push(SelectedPrinciple {
            id,
            title: title.to_string(),
            description: description.trim().to_string(),
            source: SourceKind::Custom,
            original_id: None,
        });
        Some(id)
    }

    /// Returns false when no entry has `id`.
    pub fn edit(&mut self, id: Uuid, title: Option<&str>, description: Option<&str>) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if let Some(title) = title {
            entry.title = title.to_string();
        }
        if let Some(description) = description {
            entry.description = description.to_string();
        }
        true
    }

    /// Returns false when no entry has `id`.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn drafts(&self) -> Vec<PrincipleDraft> {
        self.entries
            .iter()
            .map(|e| PrincipleDraft {
                title: e.title.clone(),
                description: e.description.clone(),
                original_principle_id: e.original_id,
            })
            .collect()
    }

    /// Create a custom template from the working set.
    ///
    /// The set is cleared only when the store accepts the template; any failure
    /// leaves it untouched for a retry.
    pub async fn commit(
        &mut self,
        store: &TemplateService,
        ctx: &SessionContext,
        organization_id: Uuid,
        name: &str,
        tags: Vec<String>,
        status: TemplateStatus,
    ) -> Result<Template, AppError> {
        if self.entries.is_empty() {
            return Err(AppError::InvalidInput(
                "Select at least one principle before saving".to_string(),
            ));
        }

        let template = store
            .create_custom(
                ctx,
                organization_id,
                CreateTemplate {
                    name: name.to_string(),
                    description: None,
                    tags,
                    principles: self.drafts(),
                    status,
                },
            )
            .await?;

        self.entries.clear();
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard(title: &str) -> Principle {
        Principle {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{} description", title),
            source_kind: SourceKind::Standard,
            original_principle_id: None,
            position: 0,
        }
    }

    #[test]
    fn test_fork_then_deselect_restores_prior_state() {
        let mut selector = PrincipleSelector::new();
        selector.add_custom("Candor", "Say the hard thing kindly");
        let before = selector.clone();

        let principle = standard("Ownership");
        assert!(selector.fork_standard(&principle));
        assert!(selector.is_forked(principle.id));
        assert!(!selector.fork_standard(&principle));

        assert_eq!(selector, before);
    }

    #[test]
    fn test_fork_copies_by_value() {
        let mut selector = PrincipleSelector::new();
        let principle = standard("Customer Obsession");
        selector.fork_standard(&principle);

        let entry = selector.entries()[0].clone();
        assert_ne!(entry.id, principle.id);
        assert_eq!(entry.original_id, Some(principle.id));
        assert_eq!(entry.source, SourceKind::Standard);

        selector.edit(entry.id, None, Some("Rewritten locally"));
        assert_eq!(selector.entries()[0].description, "Rewritten locally");
        assert_eq!(principle.description, "Customer Obsession description");
    }

    #[test]
    fn test_add_custom_has_no_origin() {
        let mut selector = PrincipleSelector::new();
        let id = selector.add_custom("  Frugality ", "Do more with less").unwrap();
        let entry = &selector.entries()[0];
        assert_eq!(entry.id, id);
        assert_eq!(entry.title, "Frugality");
        assert_eq!(entry.source, SourceKind::Custom);
        assert_eq!(entry.original_id, None);
    }

    #[test]
    fn test_add_custom_rejects_blank_title_without_mutation() {
        let mut selector = PrincipleSelector::new();
        assert_eq!(selector.add_custom("   ", "ignored"), None);
        assert!(selector.is_empty());
    }

    #[test]
    fn test_edit_and_remove_unknown_ids_are_noops() {
        let mut selector = PrincipleSelector::new();
        selector.add_custom("Candor", "");
        let snapshot = selector.clone();

        assert!(!selector.edit(Uuid::new_v4(), Some("x"), None));
        assert!(!selector.remove(Uuid::new_v4()));
        assert_eq!(selector, snapshot);
    }

    #[test]
    fn test_remove_deletes_entry() {
        let mut selector = PrincipleSelector::new();
        let id = selector.add_custom("Candor", "").unwrap();
        selector.add_custom("Grit", "");
        assert!(selector.remove(id));
        assert_eq!(selector.len(), 1);
        assert_eq!(selector.entries()[0].title, "Grit");
    }
}
