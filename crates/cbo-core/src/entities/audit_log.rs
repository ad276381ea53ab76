//! Audit log entry - append-only record of privileged mutations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::value_objects::Snowflake;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    RoleAssigned,
    RoleSuperseded,
    ObligationCreated,
    ObligationsBulkCreated,
    ObligationsSwept,
    PaymentSubmitted,
    PaymentReconciled,
    PaymentFlagged,
    PaymentFailed,
    PaymentApproved,
    PaymentRejected,
    MemberInvited,
    ProfileUpdated,
    WebhookProcessingFailed,
}

impl AuditAction {
    pub const ALL: [AuditAction; 14] = [
        Self::RoleAssigned,
        Self::RoleSuperseded,
        Self::ObligationCreated,
        Self::ObligationsBulkCreated,
        Self::ObligationsSwept,
        Self::PaymentSubmitted,
        Self::PaymentReconciled,
        Self::PaymentFlagged,
        Self::PaymentFailed,
        Self::PaymentApproved,
        Self::PaymentRejected,
        Self::MemberInvited,
        Self::ProfileUpdated,
        Self::WebhookProcessingFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleAssigned => "ROLE_ASSIGNED",
            Self::RoleSuperseded => "ROLE_SUPERSEDED",
            Self::ObligationCreated => "OBLIGATION_CREATED",
            Self::ObligationsBulkCreated => "OBLIGATIONS_BULK_CREATED",
            Self::ObligationsSwept => "OBLIGATIONS_SWEPT",
            Self::PaymentSubmitted => "PAYMENT_SUBMITTED",
            Self::PaymentReconciled => "PAYMENT_RECONCILED",
            Self::PaymentFlagged => "PAYMENT_FLAGGED",
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::PaymentApproved => "PAYMENT_APPROVED",
            Self::PaymentRejected => "PAYMENT_REJECTED",
            Self::MemberInvited => "MEMBER_INVITED",
            Self::ProfileUpdated => "PROFILE_UPDATED",
            Self::WebhookProcessingFailed => "WEBHOOK_PROCESSING_FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogEntry {
    pub id: Snowflake,
    pub action: AuditAction,
    pub description: String,
    /// None when the system or a gateway acted
    pub actor_id: Option<Snowflake>,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(id: Snowflake, action: AuditAction, description: impl Into<String>) -> Self {
        Self {
            id,
            action,
            description: description.into(),
            actor_id: None,
            target_type: None,
            target_id: None,
            metadata: Value::Object(serde_json::Map::new()),
            created_at: Utc::now(),
        }
    }

    pub fn actor(mut self, actor_id: Snowflake) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn target(mut self, target_type: &str, target_id: impl ToString) -> Self {
        self.target_type = Some(target_type.to_string());
        self.target_id = Some(target_id.to_string());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}
