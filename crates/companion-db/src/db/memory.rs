//! In-process backend.
//!
//! A single `MemoryDatabase` implements every repository trait over one shared state
//! behind a `tokio::sync::RwLock`. Each operation takes the write lock for its whole
//! duration, which gives the same all-or-nothing behavior as the PostgreSQL
//! transactions and enforces the same unique keys.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use companion_core::models::{
    Invitation, InvitationStatus, NewInvitation, NewReviewRequest, NewTemplate, NewUser,
    Organization, Principle, Ratings, ReviewRequest, ReviewRequestStatus, ReviewSubmission, Role,
    SourceKind, Template, TemplateStatus, User,
};
use companion_core::AppError;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::{
    InvitationRepository, ManagedReview, NewAccount, OrganizationRepository, ReviewRepository,
    TemplateRepository, UserRepository,
};

struct StoredUser {
    user: User,
    password_hash: String,
}

struct StoredInvitation {
    invitation: Invitation,
    token_hash: String,
}

/// Case-insensitive match mirroring `LOWER(a) = LOWER(b)` in Postgres.
fn same_folded(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[derive(Default)]
struct MemoryState {
    organizations: Vec<Organization>,
    users: Vec<StoredUser>,
    templates: Vec<Template>,
    invitations: Vec<StoredInvitation>,
    reviews: Vec<ReviewRequest>,
    submissions: Vec<ReviewSubmission>,
}

impl MemoryState {
    fn email_taken(&self, organization_id: Uuid, email: &str) -> bool {
        self.users.iter().any(|u| {
            u.user.organization_id == organization_id && same_folded(&u.user.email, email)
        })
    }

    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.user.id == id).map(|u| &u.user)
    }

    fn insert_user(&mut self, new_user: NewUser, now: DateTime<Utc>) -> Result<User, AppError> {
        if self.email_taken(new_user.organization_id, &new_user.email) {
            return Err(AppError::Duplicate(format!(
                "A member with email '{}' already exists",
                new_user.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            organization_id: new_user.organization_id,
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            manager_id: new_user.manager_id,
            created_at: now,
        };
        self.users.push(StoredUser {
            user: user.clone(),
            password_hash: new_user.password_hash,
        });
        Ok(user)
    }
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizationRepository for MemoryDatabase {
    async fn create_with_admin(
        &self,
        name: &str,
        admin: NewAccount,
    ) -> Result<(Organization, User), AppError> {
        let mut state = self.state.write().await;
        if state
            .organizations
            .iter()
            .any(|o| same_folded(&o.name, name))
        {
            return Err(AppError::Duplicate(format!(
                "Organization '{}' already exists",
                name
            )));
        }

        let now = Utc::now();
        let organization = Organization {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
        };
        state.organizations.push(organization.clone());
        let user = state.insert_user(
            NewUser {
                organization_id: organization.id,
                name: admin.name,
                email: admin.email,
                role: Role::Admin,
                manager_id: None,
                password_hash: admin.password_hash,
            },
            now,
        )?;

        tracing::info!(
            organization_id = %organization.id,
            admin_id = %user.id,
            "Organization created"
        );
        Ok((organization, user))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        let state = self.state.read().await;
        Ok(state.organizations.iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Organization>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .organizations
            .iter()
            .find(|o| same_folded(&o.name, name))
            .cloned())
    }
}

#[async_trait]
impl UserRepository for MemoryDatabase {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.user(id).cloned())
    }

    async fn find_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| {
                u.user.organization_id == organization_id
                    && same_folded(&u.user.email, email)
            })
            .map(|u| u.user.clone()))
    }

    async fn find_credentials(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<(User, String)>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| {
                u.user.organization_id == organization_id
                    && same_folded(&u.user.email, email)
            })
            .map(|u| (u.user.clone(), u.password_hash.clone())))
    }

    async fn list_by_organization(&self, organization_id: Uuid) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .iter()
            .filter(|u| u.user.organization_id == organization_id)
            .map(|u| u.user.clone())
            .collect();
        users.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(users)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.user.id != id);
        if state.users.len() == before {
            return Ok(false);
        }

        // Mirror the foreign keys: SET NULL on reports, CASCADE on everything else.
        for stored in state.users.iter_mut() {
            if stored.user.manager_id == Some(id) {
                stored.user.manager_id = None;
            }
        }
        state.invitations.retain(|i| i.invitation.sender_id != id);
        let removed: Vec<Uuid> = state
            .reviews
            .iter()
            .filter(|r| r.target_id == id || r.reviewer_id == id || r.requester_id == id)
            .map(|r| r.id)
            .collect();
        state.reviews.retain(|r| !removed.contains(&r.id));
        state
            .submissions
            .retain(|s| !removed.contains(&s.review_request_id));

        tracing::info!(user_id = %id, "User deleted");
        Ok(true)
    }

    async fn set_manager(
        &self,
        id: Uuid,
        manager_id: Option<Uuid>,
    ) -> Result<Option<User>, AppError> {
        let mut state = self.state.write().await;
        Ok(state
            .users
            .iter_mut()
            .find(|u| u.user.id == id)
            .map(|stored| {
                stored.user.manager_id = manager_id;
                stored.user.clone()
            }))
    }
}

#[async_trait]
impl TemplateRepository for MemoryDatabase {
    async fn list_standard(&self) -> Result<Vec<Template>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .templates
            .iter()
            .filter(|t| t.is_standard() && t.status == TemplateStatus::Published)
            .cloned()
            .collect())
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Template>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .templates
            .iter()
            .rev()
            .filter(|t| t.organization_id == Some(organization_id))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>, AppError> {
        let state = self.state.read().await;
        Ok(state.templates.iter().find(|t| t.id == id).cloned())
    }

    async fn create(&self, template: NewTemplate) -> Result<Template, AppError> {
        let mut state = self.state.write().await;
        let id = Uuid::new_v4();
        let principles = template
            .principles
            .into_iter()
            .enumerate()
            .map(|(position, p)| Principle {
                id: p.id,
                template_id: id,
                title: p.title,
                description: p.description,
                source_kind: p.source_kind,
                original_principle_id: p.original_principle_id,
                position: position as i32,
            })
            .collect();
        let created = Template {
            id,
            organization_id: template.organization_id,
            name: template.name,
            description: template.description,
            status: template.status,
            tags: template.tags,
            principles,
            created_at: Utc::now(),
        };
        state.templates.push(created.clone());

        tracing::info!(
            template_id = %created.id,
            organization_id = ?created.organization_id,
            principle_count = created.principles.len(),
            status = ?created.status,
            "Template created"
        );
        Ok(created)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: TemplateStatus,
    ) -> Result<Option<Template>, AppError> {
        let mut state = self.state.write().await;
        Ok(state.templates.iter_mut().find(|t| t.id == id).map(|t| {
            t.status = status;
            t.clone()
        }))
    }

    async fn existing_standard_principles(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .templates
            .iter()
            .filter(|t| t.is_standard())
            .flat_map(|t| t.principles.iter())
            .filter(|p| p.source_kind == SourceKind::Standard && ids.contains(&p.id))
            .map(|p| p.id)
            .collect())
    }

    async fn latest_published(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Template>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .templates
            .iter()
            .rev()
            .find(|t| {
                t.organization_id == Some(organization_id)
                    && t.status == TemplateStatus::Published
            })
            .cloned())
    }

    async fn count_standard(&self) -> Result<i64, AppError> {
        let state = self.state.read().await;
        Ok(state.templates.iter().filter(|t| t.is_standard()).count() as i64)
    }
}

#[async_trait]
impl InvitationRepository for MemoryDatabase {
    async fn create(&self, invitation: NewInvitation) -> Result<Invitation, AppError> {
        let mut state = self.state.write().await;
        if state
            .invitations
            .iter()
            .any(|i| i.token_hash == invitation.token_hash)
        {
            return Err(AppError::Duplicate("Invitation token collision".to_string()));
        }
        let created = Invitation {
            id: Uuid::new_v4(),
            organization_id: invitation.organization_id,
            sender_id: invitation.sender_id,
            email: invitation.email,
            role: invitation.role,
            status: InvitationStatus::Pending,
            expires_at: invitation.expires_at,
            created_at: Utc::now(),
            accepted_at: None,
        };
        state.invitations.push(StoredInvitation {
            invitation: created.clone(),
            token_hash: invitation.token_hash,
        });

        tracing::info!(
            invitation_id = %created.id,
            organization_id = %created.organization_id,
            sender_id = %created.sender_id,
            role = %created.role,
            "Invitation issued"
        );
        Ok(created)
    }

    async fn list(
        &self,
        organization_id: Uuid,
        sender_id: Option<Uuid>,
    ) -> Result<Vec<Invitation>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .invitations
            .iter()
            .rev()
            .map(|i| &i.invitation)
            .filter(|i| i.organization_id == organization_id)
            .filter(|i| sender_id.map_or(true, |sender| i.sender_id == sender))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .invitations
            .iter()
            .find(|i| i.invitation.id == id)
            .map(|i| i.invitation.clone()))
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .invitations
            .iter()
            .find(|i| i.token_hash == token_hash)
            .map(|i| i.invitation.clone()))
    }

    async fn revoke(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Invitation>, AppError> {
        let mut state = self.state.write().await;
        let revoked = state
            .invitations
            .iter_mut()
            .map(|i| &mut i.invitation)
            .find(|i| i.id == id && i.effective_status(now) == InvitationStatus::Pending)
            .map(|i| {
                i.status = InvitationStatus::Revoked;
                i.clone()
            });

        if let Some(ref invitation) = revoked {
            tracing::info!(invitation_id = %invitation.id, "Invitation revoked");
        }
        Ok(revoked)
    }

    async fn accept(
        &self,
        id: Uuid,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<Option<(Invitation, User)>, AppError> {
        let mut state = self.state.write().await;
        let claimable = state.invitations.iter().any(|i| {
            i.invitation.id == id && i.invitation.effective_status(now) == InvitationStatus::Pending
        });
        if !claimable {
            return Ok(None);
        }

        // Create the user first so a duplicate email leaves the invitation untouched.
        let created = state.insert_user(user, now)?;
        let invitation = state
            .invitations
            .iter_mut()
            .map(|i| &mut i.invitation)
            .find(|i| i.id == id)
            .map(|i| {
                i.status = InvitationStatus::Accepted;
                i.accepted_at = Some(now);
                i.clone()
            })
            .ok_or_else(|| AppError::Internal("Claimed invitation disappeared".to_string()))?;

        tracing::info!(
            invitation_id = %invitation.id,
            user_id = %created.id,
            organization_id = %created.organization_id,
            "Invitation accepted"
        );
        Ok(Some((invitation, created)))
    }
}

#[async_trait]
impl ReviewRepository for MemoryDatabase {
    async fn create(&self, request: NewReviewRequest) -> Result<ReviewRequest, AppError> {
        let mut state = self.state.write().await;
        if state.reviews.iter().any(|r| {
            r.target_id == request.target_id
                && r.reviewer_id == request.reviewer_id
                && r.quarter == request.quarter
        }) {
            return Err(AppError::Duplicate(format!(
                "Review already requested for this reviewer in {}",
                request.quarter
            )));
        }
        let created = ReviewRequest {
            id: Uuid::new_v4(),
            organization_id: request.organization_id,
            quarter: request.quarter,
            target_id: request.target_id,
            reviewer_id: request.reviewer_id,
            requester_id: request.requester_id,
            status: ReviewRequestStatus::Pending,
            created_at: Utc::now(),
        };
        state.reviews.push(created.clone());

        tracing::info!(
            review_request_id = %created.id,
            target_id = %created.target_id,
            reviewer_id = %created.reviewer_id,
            quarter = %created.quarter,
            "Review requested"
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ReviewRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn list_for_reviewer(
        &self,
        reviewer_id: Uuid,
        status: Option<ReviewRequestStatus>,
    ) -> Result<Vec<ReviewRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .iter()
            .rev()
            .filter(|r| r.reviewer_id == reviewer_id)
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect())
    }

    async fn list_for_manager(&self, manager_id: Uuid) -> Result<Vec<ManagedReview>, AppError> {
        let state = self.state.read().await;
        let mut managed: Vec<ManagedReview> = state
            .reviews
            .iter()
            .filter_map(|r| {
                let target = state.user(r.target_id)?;
                if target.manager_id != Some(manager_id) {
                    return None;
                }
                let reviewer = state.user(r.reviewer_id)?;
                Some(ManagedReview {
                    request: r.clone(),
                    target: target.clone(),
                    reviewer: reviewer.clone(),
                })
            })
            .collect();
        managed.sort_by(|a, b| {
            b.request
                .quarter
                .cmp(&a.request.quarter)
                .then(a.target.name.to_lowercase().cmp(&b.target.name.to_lowercase()))
        });
        Ok(managed)
    }

    async fn complete(
        &self,
        id: Uuid,
        ratings: Ratings,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewSubmission>, AppError> {
        let mut state = self.state.write().await;
        let Some(request) = state
            .reviews
            .iter_mut()
            .find(|r| r.id == id && r.status == ReviewRequestStatus::Pending)
        else {
            return Ok(None);
        };
        request.status = ReviewRequestStatus::Completed;

        let submission = ReviewSubmission {
            id: Uuid::new_v4(),
            review_request_id: id,
            ratings,
            submitted_at: now,
        };
        state.submissions.push(submission.clone());

        tracing::info!(
            review_request_id = %id,
            submission_id = %submission.id,
            rating_count = submission.ratings.len(),
            "Review submitted"
        );
        Ok(Some(submission))
    }

    async fn decline(&self, id: Uuid) -> Result<Option<ReviewRequest>, AppError> {
        let mut state = self.state.write().await;
        let declined = state
            .reviews
            .iter_mut()
            .find(|r| r.id == id && r.status == ReviewRequestStatus::Pending)
            .map(|r| {
                r.status = ReviewRequestStatus::Declined;
                r.clone()
            });

        if let Some(ref request) = declined {
            tracing::info!(review_request_id = %request.id, "Review declined");
        }
        Ok(declined)
    }

    async fn find_submission(
        &self,
        review_request_id: Uuid,
    ) -> Result<Option<ReviewSubmission>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .submissions
            .iter()
            .find(|s| s.review_request_id == review_request_id)
            .cloned())
    }
}
