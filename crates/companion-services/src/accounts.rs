//! Organization signup, sign-in and roster management.

use companion_core::models::{Role, User};
use companion_core::validation::{normalize_email, require_text, validate_password};
use companion_core::{AppError, SessionContext};
use companion_db::{NewAccount, OrganizationRepository, UserRepository};
use std::sync::Arc;
use uuid::Uuid;

use crate::credentials::{hash_password, verify_password};
use crate::session_tokens::{AuthenticatedSession, SessionTokens};

#[derive(Debug, Clone)]
pub struct SignupOrganization {
    pub org_name: String,
    pub admin_name: String,
    pub email: String,
    pub password: String,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

#[derive(Clone)]
pub struct AccountService {
    organizations: Arc<dyn OrganizationRepository>,
    users: Arc<dyn UserRepository>,
    tokens: SessionTokens,
}

impl AccountService {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        users: Arc<dyn UserRepository>,
        tokens: SessionTokens,
    ) -> Self {
        Self {
            organizations,
            users,
            tokens,
        }
    }

    /// Create an organization together with its first admin and sign that admin in.
    #[tracing::instrument(skip_all, fields(org_name = %request.org_name))]
    pub async fn signup_org(
        &self,
        request: SignupOrganization,
    ) -> Result<AuthenticatedSession, AppError> {
        let org_name = require_text("Organization name", &request.org_name)?;
        let admin_name = require_text("Name", &request.admin_name)?;
        let email = normalize_email(&request.email)?;
        validate_password(&request.password)?;

        let (organization, admin) = self
            .organizations
            .create_with_admin(
                &org_name,
                NewAccount {
                    name: admin_name,
                    email,
                    password_hash: hash_password(&request.password)?,
                },
            )
            .await?;

        tracing::info!(
            organization_id = %organization.id,
            user_id = %admin.id,
            "Organization signed up"
        );

        self.tokens.start_session(admin)
    }

    /// Mismatches of any field are reported identically.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        org_name: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, AppError> {
        let email = normalize_email(email).map_err(|_| invalid_credentials())?;
        let organization = self
            .organizations
            .find_by_name(org_name.trim())
            .await?
            .ok_or_else(invalid_credentials)?;

        let (user, password_hash) = self
            .users
            .find_credentials(organization.id, &email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &password_hash)? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(invalid_credentials());
        }

        self.tokens.start_session(user)
    }

    /// The user behind the session, if it still exists.
    pub async fn current_user(&self, ctx: &SessionContext) -> Result<User, AppError> {
        self.users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))
    }

    /// Organization roster ordered by name.
    pub async fn list_users(
        &self,
        ctx: &SessionContext,
        organization_id: Uuid,
    ) -> Result<Vec<User>, AppError> {
        ctx.require_organization(organization_id)?;
        self.users.list_by_organization(organization_id).await
    }

    #[tracing::instrument(skip(self, ctx), fields(admin_id = %ctx.user_id))]
    pub async fn delete_user(&self, ctx: &SessionContext, user_id: Uuid) -> Result<(), AppError> {
        ctx.require_admin()?;
        if user_id == ctx.user_id {
            return Err(AppError::InvalidInput(
                "Admins cannot delete their own account".to_string(),
            ));
        }
        self.member(ctx, user_id).await?;

        if !self.users.delete(user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        tracing::info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// Set or clear a user's manager.
    #[tracing::instrument(skip(self, ctx), fields(admin_id = %ctx.user_id))]
    pub async fn assign_manager(
        &self,
        ctx: &SessionContext,
        user_id: Uuid,
        manager_id: Option<Uuid>,
    ) -> Result<User, AppError> {
        ctx.require_admin()?;
        self.member(ctx, user_id).await?;

        if let Some(manager_id) = manager_id {
            if manager_id == user_id {
                return Err(AppError::InvalidInput(
                    "A user cannot manage themselves".to_string(),
                ));
            }
            let manager = self.member(ctx, manager_id).await?;
            if manager.role == Role::Employee {
                return Err(AppError::InvalidInput(
                    "Managers must have the MANAGER or ADMIN role".to_string(),
                ));
            }
        }

        self.users
            .set_manager(user_id, manager_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn member(&self, ctx: &SessionContext, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .filter(|u| u.organization_id == ctx.organization_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
