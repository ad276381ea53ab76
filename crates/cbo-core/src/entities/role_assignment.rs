//! Role assignment entity
//!
//! Assignments are never deleted. Removing a role stamps `superseded_at`; re-granting it
//! creates a new row.

use chrono::{DateTime, Utc};

use crate::value_objects::{MemberRole, Snowflake};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub id: Snowflake,
    pub user_id: Snowflake,
    pub role: MemberRole,
    pub assigned_by: Option<Snowflake>,
    pub assigned_at: DateTime<Utc>,
    pub superseded_at: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    pub fn new(
        id: Snowflake,
        user_id: Snowflake,
        role: MemberRole,
        assigned_by: Option<Snowflake>,
    ) -> Self {
        Self {
            id,
            user_id,
            role,
            assigned_by,
            assigned_at: Utc::now(),
            superseded_at: None,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.superseded_at.is_none()
    }
}
