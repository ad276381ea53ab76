//! Permission service
//!
//! Loads the roles a member holds and evaluates them with the role hierarchy.

use cbo_core::{DomainError, Permissions, RoleSet, Snowflake};
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Permission service for access control
pub struct PermissionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PermissionService<'a> {
    /// Create a new PermissionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Active roles of a member
    #[instrument(skip(self))]
    pub async fn roles_for(&self, user_id: Snowflake) -> ServiceResult<RoleSet> {
        let assignments = self.ctx.role_repo().find_active_by_user(user_id).await?;
        Ok(assignments.into_iter().map(|a| a.role).collect())
    }

    /// Effective permissions of a member
    #[instrument(skip(self))]
    pub async fn permissions_for(&self, user_id: Snowflake) -> ServiceResult<Permissions> {
        let roles = self.roles_for(user_id).await?;
        let permissions = roles.permissions();

        debug!(
            user_id = %user_id,
            roles = roles.len(),
            permissions = ?permissions,
            "Computed member permissions"
        );

        Ok(permissions)
    }
}

/// Parse a single snake_case permission key
pub fn parse_permission_key(key: &str) -> ServiceResult<Permissions> {
    Permissions::from_key(key).ok_or_else(|| DomainError::UnknownPermission(key.to_string()).into())
}
