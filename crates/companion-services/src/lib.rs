//! Companion Services
//!
//! Business operations over the repositories: the template store, the principle
//! selector, invitations, review requests and accounts. Every operation that acts on
//! behalf of a user takes an explicit [`SessionContext`](companion_core::SessionContext).

pub mod accounts;
pub mod credentials;
pub mod invitations;
pub mod notifier;
pub mod reviews;
pub mod selector;
pub mod session_tokens;
pub mod templates;

use companion_db::Repositories;
use std::sync::Arc;

pub use accounts::{AccountService, SignupOrganization};
pub use invitations::{InvitationService, InviteEntry, InviteOutcome, IssueReport};
pub use notifier::{create_notifier, InvitationNotifier, LogInvitationNotifier};
pub use reviews::{RequestReview, ReviewService};
pub use selector::{PrincipleSelector, SelectedPrinciple};
pub use session_tokens::{AuthenticatedSession, SessionTokens};
pub use templates::{CreateTemplate, TemplateService};

/// Every service, wired to one repository set.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub templates: TemplateService,
    pub invitations: InvitationService,
    pub reviews: ReviewService,
    pub tokens: SessionTokens,
}

impl Services {
    pub fn new(
        repositories: &Repositories,
        tokens: SessionTokens,
        notifier: Arc<dyn InvitationNotifier>,
    ) -> Self {
        Self {
            accounts: AccountService::new(
                repositories.organizations.clone(),
                repositories.users.clone(),
                tokens.clone(),
            ),
            templates: TemplateService::new(repositories.templates.clone()),
            invitations: InvitationService::new(
                repositories.invitations.clone(),
                repositories.users.clone(),
                notifier,
                tokens.clone(),
            ),
            reviews: ReviewService::new(repositories.reviews.clone(), repositories.users.clone()),
            tokens,
        }
    }
}
