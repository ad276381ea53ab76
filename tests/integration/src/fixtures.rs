//! Test fixtures and data generators
//!
//! Provides reusable request and response shapes for integration tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Profile create or update
#[derive(Debug, Default, Serialize)]
pub struct UpsertProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
}

impl UpsertProfileRequest {
    /// Every field needed for a complete profile
    pub fn complete() -> Self {
        let suffix = unique_suffix();
        Self {
            full_name: Some(format!("Test Member {suffix}")),
            email: None,
            phone: Some("0712345678".to_string()),
            id_number: Some(format!("{:08}", 10_000_000 + suffix)),
        }
    }
}

/// Profile response
#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub id_number: Option<String>,
    pub email_confirmed: bool,
    pub phone_verified: bool,
    pub complete: bool,
}

/// Session response
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub status: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// Roles and permissions held by the caller
#[derive(Debug, Deserialize)]
pub struct PermissionsResponse {
    pub user_id: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// Route guard response
#[derive(Debug, Deserialize)]
pub struct GuardResponse {
    pub path: String,
    pub status: String,
    pub decision: Value,
}

/// Role assignment request
#[derive(Debug, Serialize)]
pub struct AssignRoleRequest {
    pub role: String,
}

/// Role assignment response
#[derive(Debug, Deserialize)]
pub struct RoleAssignmentResponse {
    pub id: String,
    pub user_id: String,
    pub role: String,
}

/// Obligation create request
#[derive(Debug, Serialize)]
pub struct CreateObligationRequest {
    pub member_id: String,
    pub obligation_type: String,
    pub amount: f64,
    pub due_date: String,
    pub description: Option<String>,
    pub event_ref: Option<String>,
}

impl CreateObligationRequest {
    /// A regular contribution due in a month
    pub fn regular(member_id: &str, amount: f64) -> Self {
        let due = chrono::Utc::now().date_naive() + chrono::Duration::days(30);
        Self {
            member_id: member_id.to_string(),
            obligation_type: "regular".to_string(),
            amount,
            due_date: due.to_string(),
            description: Some(format!("Monthly contribution {}", unique_suffix())),
            event_ref: None,
        }
    }
}

/// Obligation response
#[derive(Debug, Deserialize)]
pub struct ObligationResponse {
    pub id: String,
    pub member_id: String,
    pub obligation_type: String,
    pub amount: Value,
    pub due_date: String,
    pub status: String,
    pub payment_reference: Option<String>,
}

/// Payment initiation request
#[derive(Debug, Default, Serialize)]
pub struct InitiatePaymentRequest {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_url: Option<String>,
}

impl InitiatePaymentRequest {
    /// Cash handed to the treasurer, identified by a unique receipt
    pub fn cash() -> Self {
        Self {
            channel: "cash".to_string(),
            receipt_number: Some(format!("RCPT{}", unique_suffix())),
            ..Default::default()
        }
    }
}

/// Payment transaction response
#[derive(Debug, Deserialize)]
pub struct TransactionResponse {
    pub id: String,
    pub obligation_id: Option<String>,
    pub channel: String,
    pub tracking_id: Option<String>,
    pub amount: Value,
    pub status: String,
    pub receipt_number: Option<String>,
}

/// Payment initiation response
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentResponse {
    pub transaction: TransactionResponse,
    pub redirect_url: Option<String>,
    pub message: String,
}

/// Approval decision
#[derive(Debug, Serialize)]
pub struct PaymentDecisionRequest {
    pub decision: String,
    pub notes: Option<String>,
}

impl PaymentDecisionRequest {
    pub fn approve() -> Self {
        Self {
            decision: "approved".to_string(),
            notes: None,
        }
    }

    pub fn reject(notes: &str) -> Self {
        Self {
            decision: "rejected".to_string(),
            notes: Some(notes.to_string()),
        }
    }
}

/// Member dashboard summary
#[derive(Debug, Deserialize)]
pub struct MemberSummary {
    pub member_id: String,
    pub pending_count: i64,
    pub paid_count: i64,
    pub missed_count: i64,
    pub collection_rate: f64,
}

/// Audit log entry
#[derive(Debug, Deserialize)]
pub struct AuditLogResponse {
    pub id: String,
    pub action: String,
    pub description: String,
}

/// Cursor pagination
#[derive(Debug, Deserialize)]
pub struct PaginationMeta {
    pub before: Option<String>,
    pub has_more: bool,
    pub limit: i64,
}

/// Paginated list
#[derive(Debug, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Error response
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
