//! Authenticated identity threaded through every service call.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;

/// Who is acting, in which organization, with which role.
///
/// Built from a verified session token at the HTTP boundary and passed explicitly
/// to each operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: Role,
}

impl SessionContext {
    pub fn new(user_id: Uuid, organization_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            organization_id,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only organization admins can perform this action".to_string(),
            ))
        }
    }

    pub fn require_people_manager(&self) -> Result<(), AppError> {
        if self.role.can_manage_people() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only admins and managers can perform this action".to_string(),
            ))
        }
    }

    /// Reject access to another organization's data.
    pub fn require_organization(&self, organization_id: Uuid) -> Result<(), AppError> {
        if self.organization_id == organization_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Access to another organization is not allowed".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_gates() {
        let org = Uuid::new_v4();
        let admin = SessionContext::new(Uuid::new_v4(), org, Role::Admin);
        let manager = SessionContext::new(Uuid::new_v4(), org, Role::Manager);
        let employee = SessionContext::new(Uuid::new_v4(), org, Role::Employee);

        assert!(admin.require_admin().is_ok());
        assert!(manager.require_admin().is_err());
        assert!(manager.require_people_manager().is_ok());
        assert!(matches!(
            employee.require_people_manager(),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_organization_gate() {
        let ctx = SessionContext::new(Uuid::new_v4(), Uuid::new_v4(), Role::Admin);
        assert!(ctx.require_organization(ctx.organization_id).is_ok());
        assert!(ctx.require_organization(Uuid::new_v4()).is_err());
    }
}
