//! Role assignment mapper

use cbo_core::entities::RoleAssignment;
use cbo_core::error::DomainError;
use cbo_core::value_objects::{MemberRole, Snowflake};

use super::corrupt_column;
use crate::models::RoleAssignmentModel;

impl TryFrom<RoleAssignmentModel> for RoleAssignment {
    type Error = DomainError;

    fn try_from(model: RoleAssignmentModel) -> Result<Self, Self::Error> {
        let role: MemberRole = model
            .role
            .parse()
            .map_err(|_| corrupt_column("role_assignments.role", &model.role))?;

        Ok(RoleAssignment {
            id: Snowflake::new(model.id),
            user_id: Snowflake::new(model.user_id),
            role,
            assigned_by: model.assigned_by.map(Snowflake::new),
            assigned_at: model.assigned_at,
            superseded_at: model.superseded_at,
        })
    }
}
