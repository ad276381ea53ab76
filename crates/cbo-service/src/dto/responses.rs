//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output.
//! Snowflake IDs are serialized as strings for JavaScript compatibility; amounts are
//! serialized in shillings.

use cbo_core::{FlagReason, GuardDecision, Money};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Common Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Paginated response with cursor-based pagination
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, before: Option<String>, has_more: bool, limit: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta {
                before,
                has_more,
                limit,
            },
        }
    }
}

/// Pagination metadata
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Cursor for fetching the next (older) page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Whether more results exist
    pub has_more: bool,
    /// Page size limit used
    pub limit: i64,
}

// ============================================================================
// Session and Permission Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    /// `checking`, `signed_out`, `needs_email_verification`, `needs_profile` or `ready`
    pub status: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuardResponse {
    pub path: String,
    pub status: String,
    pub decision: GuardDecision,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionsResponse {
    pub user_id: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionCheckResponse {
    pub permission: String,
    pub granted: bool,
}

// ============================================================================
// Profile and Role Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub id_number: Option<String>,
    pub email_confirmed: bool,
    pub phone_verified: bool,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleAssignmentResponse {
    pub id: String,
    pub user_id: String,
    pub role: String,
    pub role_name: String,
    pub assigned_by: Option<String>,
    pub assigned_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Obligation Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ObligationResponse {
    pub id: String,
    pub member_id: String,
    pub obligation_type: String,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub status: String,
    pub description: Option<String>,
    pub event_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkObligationResponse {
    pub created: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub missed: usize,
}

// ============================================================================
// Payment Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub obligation_id: Option<String>,
    pub payer_id: Option<String>,
    pub channel: String,
    pub tracking_id: Option<String>,
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_amount: Option<Money>,
    pub status: String,
    pub receipt_number: Option<String>,
    pub proof_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<FlagReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub decided_by: Option<String>,
    pub decision_notes: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitiatePaymentResponse {
    pub transaction: TransactionResponse,
    /// Hosted checkout page for redirect-style gateways
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    pub message: String,
}

// ============================================================================
// Dashboard Responses
// ============================================================================

/// Organisation-wide collection summary; cached as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgSummary {
    pub expected: Money,
    pub collected: Money,
    pub outstanding: Money,
    pub pending_count: i64,
    pub paid_count: i64,
    pub missed_count: i64,
    pub awaiting_approval_count: i64,
    pub member_count: usize,
    /// Percentage of due obligations that were paid
    pub collection_rate: f64,
    pub generated_at: DateTime<Utc>,
}

/// One member's own summary; cached as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub member_id: String,
    pub expected: Money,
    pub collected: Money,
    pub outstanding: Money,
    pub pending_count: i64,
    pub paid_count: i64,
    pub missed_count: i64,
    pub collection_rate: f64,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Audit Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AuditLogResponse {
    pub id: String,
    pub action: String,
    pub description: String,
    pub actor_id: Option<String>,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Verification, Recovery and Invitation Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SmsVerificationResponse {
    pub phone: String,
    /// Provider status (`pending`, `approved`, ...)
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryResponse {
    pub message: String,
}

impl RecoveryResponse {
    /// Same answer whether or not the address belongs to a member
    pub fn accepted() -> Self {
        Self {
            message: "If that address belongs to a member, a recovery link is on its way"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvitationResponse {
    pub email: String,
    pub role: Option<String>,
    pub sent: bool,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health check status for each backing service
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
    pub redis: String,
}

impl ReadinessResponse {
    pub fn ready(database_healthy: bool, redis_healthy: bool) -> Self {
        let all_healthy = database_healthy && redis_healthy;
        Self {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: if database_healthy { "healthy" } else { "unhealthy" }.to_string(),
                redis: if redis_healthy { "healthy" } else { "unhealthy" }.to_string(),
            },
        }
    }
}
