//! Audit log entry <-> model mapper

use cbo_core::entities::{AuditAction, AuditLogEntry};
use cbo_core::error::DomainError;
use cbo_core::value_objects::Snowflake;
use serde_json::Value as JsonValue;

use super::corrupt_column;
use crate::models::AuditLogModel;

impl TryFrom<AuditLogModel> for AuditLogEntry {
    type Error = DomainError;

    fn try_from(model: AuditLogModel) -> Result<Self, Self::Error> {
        let action = AuditAction::parse(&model.action)
            .ok_or_else(|| corrupt_column("audit_logs.action", &model.action))?;

        Ok(AuditLogEntry {
            id: Snowflake::new(model.id),
            action,
            description: model.description,
            actor_id: model.actor_id.map(Snowflake::new),
            target_type: model.target_type,
            target_id: model.target_id,
            metadata: model.metadata,
            created_at: model.created_at,
        })
    }
}

pub struct AuditLogInsert<'a> {
    pub id: i64,
    pub action: &'static str,
    pub description: &'a str,
    pub actor_id: Option<i64>,
    pub target_type: Option<&'a str>,
    pub target_id: Option<&'a str>,
    pub metadata: &'a JsonValue,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl<'a> AuditLogInsert<'a> {
    pub fn new(entry: &'a AuditLogEntry) -> Self {
        Self {
            id: entry.id.into_inner(),
            action: entry.action.as_str(),
            description: &entry.description,
            actor_id: entry.actor_id.map(Snowflake::into_inner),
            target_type: entry.target_type.as_deref(),
            target_id: entry.target_id.as_deref(),
            metadata: &entry.metadata,
            created_at: entry.created_at,
        }
    }
}
