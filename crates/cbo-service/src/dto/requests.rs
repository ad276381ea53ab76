//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.
//! Amounts arrive in shillings as decimal numbers; Snowflake ids arrive as strings.

use cbo_core::PaymentDecision;
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Profile Requests
// ============================================================================

/// Create or update the caller's own profile
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpsertProfileRequest {
    #[validate(length(min = 2, max = 120, message = "Full name must be 2-120 characters"))]
    pub full_name: Option<String>,

    /// Required on first save when the session token carries no email
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// National or international format; normalized to E.164
    pub phone: Option<String>,

    #[validate(length(min = 4, max = 20, message = "ID number must be 4-20 characters"))]
    pub id_number: Option<String>,
}

// ============================================================================
// Role Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignRoleRequest {
    #[validate(length(min = 1, max = 32, message = "Role is required"))]
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionCheckQuery {
    pub permission: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuardQuery {
    pub path: String,
}

// ============================================================================
// Obligation Requests
// ============================================================================

/// Obligation for one member
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateObligationRequest {
    pub member_id: String,

    /// `regular`, `event_linked` or `penalty`
    pub obligation_type: String,

    #[validate(range(min = 0.01, max = 10_000_000.0, message = "Amount must be positive"))]
    pub amount: f64,

    pub due_date: NaiveDate,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    /// Welfare case or event that produced the liability
    #[validate(length(max = 64, message = "Event reference must be at most 64 characters"))]
    pub event_ref: Option<String>,
}

/// Same obligation for every member
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkObligationRequest {
    pub obligation_type: String,

    #[validate(range(min = 0.01, max = 10_000_000.0, message = "Amount must be positive"))]
    pub amount: f64,

    pub due_date: NaiveDate,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 64, message = "Event reference must be at most 64 characters"))]
    pub event_ref: Option<String>,
}

// ============================================================================
// Payment Requests
// ============================================================================

/// Start paying an obligation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InitiatePaymentRequest {
    /// `mpesa_stk`, `pesapal`, `till`, `bank_transfer` or `cash`
    pub channel: String,

    /// Number to push the M-Pesa prompt to; defaults to the profile's phone
    pub phone: Option<String>,

    /// Billing email for Pesapal; defaults to the profile's email
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Receipt or transaction code for manually verified channels
    #[validate(length(min = 4, max = 64, message = "Receipt number must be 4-64 characters"))]
    pub receipt_number: Option<String>,

    #[validate(url(message = "Proof must be a URL"))]
    pub proof_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentDecisionRequest {
    pub decision: PaymentDecision,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

// ============================================================================
// Verification and Recovery Requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsAction {
    Send,
    Verify,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SmsVerificationRequest {
    pub action: SmsAction,

    #[validate(length(min = 9, max = 20, message = "Phone number must be 9-20 characters"))]
    pub phone: String,

    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecoveryRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 4096, message = "CAPTCHA token is required"))]
    pub captcha_token: String,
}

// ============================================================================
// Member Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InvitationRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 2, max = 120, message = "Full name must be 2-120 characters"))]
    pub full_name: String,

    /// Role the invitee is expected to take up, shown in the email
    pub role: Option<String>,
}

// ============================================================================
// Listing
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogQuery {
    /// Only entries older than this id
    pub before: Option<String>,
    pub limit: Option<i64>,
}
