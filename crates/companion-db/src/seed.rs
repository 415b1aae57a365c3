//! Standard principle templates shipped with every installation.

use companion_core::models::{NewPrinciple, NewTemplate, SourceKind, TemplateStatus};
use companion_core::AppError;
use uuid::Uuid;

use crate::db::TemplateRepository;

struct SeedTemplate {
    name: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    principles: &'static [(&'static str, &'static str)],
}

const STANDARD_TEMPLATES: &[SeedTemplate] = &[
    SeedTemplate {
        name: "Amazon Leadership Principles",
        description: "Principles that guide decision making and the day-to-day work at Amazon.",
        tags: &["Tech", "E-commerce", "Cloud"],
        principles: &[
            (
                "Customer Obsession",
                "Leaders start with the customer and work backwards. They work vigorously to earn and keep customer trust.",
            ),
            (
                "Ownership",
                "Leaders are owners. They think long term and don't sacrifice long-term value for short-term results.",
            ),
            (
                "Bias for Action",
                "Speed matters in business. Many decisions and actions are reversible and do not need extensive study.",
            ),
        ],
    },
    SeedTemplate {
        name: "Google Philosophy",
        description: "Ten things Google has found to be true.",
        tags: &["Tech", "Search", "Innovation"],
        principles: &[
            ("Focus on the User", "Focus on the user and all else will follow."),
            (
                "Fast is better than slow",
                "We know your time is valuable, so when you're seeking an answer on the web you want it right away.",
            ),
        ],
    },
    SeedTemplate {
        name: "Netflix Culture",
        description: "The behaviors and values behind Netflix's people culture.",
        tags: &["Tech", "Streaming", "Media"],
        principles: &[
            (
                "Context Not Control",
                "Provide the insight and understanding to enable sound decisions, rather than giving orders.",
            ),
            (
                "Highly Aligned, Loosely Coupled",
                "Teams spend less time coordinating and more time executing.",
            ),
        ],
    },
];

fn standard_template(seed: &SeedTemplate) -> NewTemplate {
    NewTemplate {
        organization_id: None,
        name: seed.name.to_string(),
        description: Some(seed.description.to_string()),
        status: TemplateStatus::Published,
        tags: seed.tags.iter().map(|t| t.to_string()).collect(),
        principles: seed
            .principles
            .iter()
            .map(|(title, description)| NewPrinciple {
                id: Uuid::new_v4(),
                title: title.to_string(),
                description: description.to_string(),
                source_kind: SourceKind::Standard,
                original_principle_id: None,
            })
            .collect(),
    }
}

/// Insert the standard templates unless any standard template already exists.
///
/// Returns the number of templates inserted.
pub async fn seed_standard_templates(repo: &dyn TemplateRepository) -> Result<usize, AppError> {
    if repo.count_standard().await? > 0 {
        tracing::debug!("Standard templates already seeded");
        return Ok(0);
    }

    for seed in STANDARD_TEMPLATES {
        repo.create(standard_template(seed)).await?;
    }

    tracing::info!(
        count = STANDARD_TEMPLATES.len(),
        "Seeded standard templates"
    );
    Ok(STANDARD_TEMPLATES.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let db = MemoryDatabase::new();
        assert_eq!(seed_standard_templates(&db).await.unwrap(), 3);
        assert_eq!(seed_standard_templates(&db).await.unwrap(), 0);

        let templates = db.list_standard().await.unwrap();
        assert_eq!(templates.len(), 3);
        assert_eq!(templates[0].name, "Amazon Leadership Principles");
        assert_eq!(templates[0].principles[0].title, "Customer Obsession");
        assert!(templates
            .iter()
            .flat_map(|t| &t.principles)
            .all(|p| p.source_kind == SourceKind::Standard));
    }
}
