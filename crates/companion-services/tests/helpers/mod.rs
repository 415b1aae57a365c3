//! Shared fixtures: services wired to a fresh in-memory store.

#![allow(dead_code)]

use async_trait::async_trait;
use companion_core::models::{Invitation, Role, User};
use companion_core::{AppError, SessionContext};
use companion_db::{seed_standard_templates, Repositories};
use companion_services::{
    AuthenticatedSession, InvitationNotifier, InviteEntry, InviteOutcome, Services,
    SessionTokens, SignupOrganization,
};
use std::sync::{Arc, Mutex};

pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long";
pub const TEST_PASSWORD: &str = "correct-horse";

/// Keeps every issued token so tests can redeem them.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl InvitationNotifier for RecordingNotifier {
    async fn invitation_issued(
        &self,
        invitation: &Invitation,
        token: &str,
    ) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((invitation.email.clone(), token.to_string()));
        Ok(())
    }
}

pub struct TestEnv {
    pub repositories: Repositories,
    pub services: Services,
    pub notifier: Arc<RecordingNotifier>,
}

pub async fn setup() -> TestEnv {
    let repositories = Repositories::memory();
    seed_standard_templates(repositories.templates.as_ref())
        .await
        .expect("seed standard templates");

    let notifier = Arc::new(RecordingNotifier::default());
    let services = Services::new(
        &repositories,
        SessionTokens::new(TEST_JWT_SECRET, 1),
        notifier.clone(),
    );

    TestEnv {
        repositories,
        services,
        notifier,
    }
}

pub fn ctx(user: &User) -> SessionContext {
    SessionContext::new(user.id, user.organization_id, user.role)
}

impl TestEnv {
    /// New organization with an admin named after it.
    pub async fn signup(&self, org_name: &str) -> AuthenticatedSession {
        self.services
            .accounts
            .signup_org(SignupOrganization {
                org_name: org_name.to_string(),
                admin_name: format!("{} Admin", org_name),
                email: format!("admin@{}.test", org_name.to_lowercase()),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .expect("signup organization")
    }

    /// Issue one invitation and return its raw token.
    pub async fn invite(&self, sender: &SessionContext, email: &str, role: Role) -> String {
        let report = self
            .services
            .invitations
            .issue(
                sender,
                vec![InviteEntry {
                    email: email.to_string(),
                    role,
                }],
            )
            .await
            .expect("issue invitation");
        match report.outcomes.into_iter().next() {
            Some(InviteOutcome::Issued { token, .. }) => token,
            other => panic!("invitation not issued: {:?}", other),
        }
    }

    /// Invite and immediately redeem, returning the new member.
    pub async fn add_member(
        &self,
        sender: &SessionContext,
        name: &str,
        email: &str,
        role: Role,
    ) -> User {
        let token = self.invite(sender, email, role).await;
        self.services
            .invitations
            .redeem(&token, name, TEST_PASSWORD)
            .await
            .expect("redeem invitation")
            .user
    }
}
