//! Role assignment database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RoleAssignmentModel {
    pub id: i64,
    pub user_id: i64,
    pub role: String,
    pub assigned_by: Option<i64>,
    pub assigned_at: DateTime<Utc>,
    pub superseded_at: Option<DateTime<Utc>>,
}
