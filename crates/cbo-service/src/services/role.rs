//! Role service
//!
//! Handles role assignment and supersession. Assignments are never deleted; superseding one
//! stamps it and leaves the row as history.

use cbo_core::{
    AuditAction, AuditLogEntry, DomainError, MemberRole, Permissions, RoleAssignment, Snowflake,
};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use crate::dto::{PermissionCheckResponse, PermissionsResponse, RoleAssignmentResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::parse_permission_key;
use super::session::SessionContext;

/// Role service
pub struct RoleService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RoleService<'a> {
    /// Create a new RoleService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Assign a role to a member
    #[instrument(skip(self, session), fields(actor_id = %session.user_id()))]
    pub async fn assign_role(
        &self,
        session: &SessionContext,
        user_id: Snowflake,
        role: &str,
    ) -> ServiceResult<RoleAssignmentResponse> {
        session.require(Permissions::MANAGE_ROLES)?;
        let role = parse_role(role)?;
        require_admin_for(session, role)?;

        if self.ctx.role_repo().find_active(user_id, role).await?.is_some() {
            return Err(DomainError::RoleAlreadyAssigned(role).into());
        }

        let assignment =
            RoleAssignment::new(self.ctx.generate_id(), user_id, role, Some(session.user_id()));
        let audit = AuditLogEntry::new(
            self.ctx.generate_id(),
            AuditAction::RoleAssigned,
            format!("Assigned {} role", role.display_name()),
        )
        .actor(session.user_id())
        .target("member", user_id)
        .metadata(json!({
            "role": role.as_str(),
            "assignment_id": assignment.id.to_string(),
        }));

        self.ctx.role_repo().create(&assignment, &audit).await?;

        info!(user_id = %user_id, role = %role, "Role assigned");

        Ok(RoleAssignmentResponse::from(&assignment))
    }

    /// Supersede a member's active role
    #[instrument(skip(self, session), fields(actor_id = %session.user_id()))]
    pub async fn supersede_role(
        &self,
        session: &SessionContext,
        user_id: Snowflake,
        role: &str,
    ) -> ServiceResult<()> {
        session.require(Permissions::MANAGE_ROLES)?;
        let role = parse_role(role)?;
        require_admin_for(session, role)?;

        if user_id == session.user_id() && role == MemberRole::Admin {
            return Err(DomainError::CannotSupersedeOwnAdmin.into());
        }

        let assignment = self
            .ctx
            .role_repo()
            .find_active(user_id, role)
            .await?
            .ok_or(DomainError::RoleAssignmentNotFound { user_id, role })?;

        let audit = AuditLogEntry::new(
            self.ctx.generate_id(),
            AuditAction::RoleSuperseded,
            format!("Superseded {} role", role.display_name()),
        )
        .actor(session.user_id())
        .target("member", user_id)
        .metadata(json!({
            "role": role.as_str(),
            "assignment_id": assignment.id.to_string(),
        }));

        let superseded = self
            .ctx
            .role_repo()
            .supersede(assignment.id, Utc::now(), &audit)
            .await?;
        if !superseded {
            // Lost a race with another supersession
            return Err(DomainError::RoleAssignmentNotFound { user_id, role }.into());
        }

        info!(user_id = %user_id, role = %role, "Role superseded");

        Ok(())
    }

    /// Active roles of a member
    #[instrument(skip(self, session))]
    pub async fn list_roles(
        &self,
        session: &SessionContext,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<RoleAssignmentResponse>> {
        session.require_self_or(user_id, Permissions::VIEW_MEMBERS)?;

        let assignments = self.ctx.role_repo().find_active_by_user(user_id).await?;
        Ok(assignments.iter().map(RoleAssignmentResponse::from).collect())
    }

    /// The caller's roles and effective permission keys
    pub fn my_permissions(&self, session: &SessionContext) -> PermissionsResponse {
        session.to_permissions_response()
    }

    /// Whether the caller holds `permission_key`
    pub fn check(
        &self,
        session: &SessionContext,
        permission_key: &str,
    ) -> ServiceResult<PermissionCheckResponse> {
        let permission = parse_permission_key(permission_key)?;
        Ok(PermissionCheckResponse {
            permission: permission_key.trim().to_ascii_lowercase(),
            granted: session.has(permission),
        })
    }
}

fn parse_role(role: &str) -> ServiceResult<MemberRole> {
    role.parse::<MemberRole>()
        .map_err(|e| ServiceError::from(DomainError::from(e)))
}

/// Only admins hand out or take away the admin role
fn require_admin_for(session: &SessionContext, role: MemberRole) -> ServiceResult<()> {
    if role == MemberRole::Admin && !session.holds_role(MemberRole::Admin) {
        return Err(ServiceError::permission_denied("admin"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[tokio::test]
    async fn test_assign_role_writes_audit() {
        let h = TestHarness::new();
        let admin = h.session(Snowflake::new(1), &[MemberRole::Admin]);
        let member = Snowflake::new(300);

        let response = RoleService::new(&h.ctx)
            .assign_role(&admin, member, "treasurer")
            .await
            .unwrap();

        assert_eq!(response.role, "treasurer");
        assert_eq!(h.store.count_audit(AuditAction::RoleAssigned), 1);
    }

    #[tokio::test]
    async fn test_assign_existing_role_conflicts() {
        let h = TestHarness::new();
        let admin = h.session(Snowflake::new(1), &[MemberRole::Admin]);
        let member = Snowflake::new(301);
        h.seed_role(member, MemberRole::Secretary);

        let err = RoleService::new(&h.ctx)
            .assign_role(&admin, member, "secretary")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "ROLE_ALREADY_ASSIGNED");
    }

    #[tokio::test]
    async fn test_secretary_cannot_assign_roles() {
        let h = TestHarness::new();
        let secretary = h.session(Snowflake::new(2), &[MemberRole::Secretary]);

        let err = RoleService::new(&h.ctx)
            .assign_role(&secretary, Snowflake::new(302), "member")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_supersede_keeps_history() {
        let h = TestHarness::new();
        let admin = h.session(Snowflake::new(1), &[MemberRole::Admin]);
        let member = Snowflake::new(303);
        h.seed_role(member, MemberRole::Treasurer);

        let service = RoleService::new(&h.ctx);
        service.supersede_role(&admin, member, "treasurer").await.unwrap();

        assert!(service.list_roles(&admin, member).await.unwrap().is_empty());
        assert_eq!(h.store.role_rows(member), 1);
        assert_eq!(h.store.count_audit(AuditAction::RoleSuperseded), 1);

        let err = service
            .supersede_role(&admin, member, "treasurer")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_admin_cannot_supersede_own_admin() {
        let h = TestHarness::new();
        let admin_id = Snowflake::new(1);
        h.seed_role(admin_id, MemberRole::Admin);
        let admin = h.session(admin_id, &[MemberRole::Admin]);

        let err = RoleService::new(&h.ctx)
            .supersede_role(&admin, admin_id, "admin")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "CANNOT_SUPERSEDE_OWN_ADMIN");
    }

    #[tokio::test]
    async fn test_check_permission_key() {
        let h = TestHarness::new();
        let secretary = h.session(Snowflake::new(2), &[MemberRole::Secretary]);
        let service = RoleService::new(&h.ctx);

        assert!(!service.check(&secretary, "manage_payments").unwrap().granted);
        assert!(service.check(&secretary, "view_members").unwrap().granted);
        assert_eq!(
            service.check(&secretary, "nope").unwrap_err().error_code(),
            "UNKNOWN_PERMISSION"
        );
    }
}
