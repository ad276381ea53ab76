//! Data transfer objects for API requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

// Re-export commonly used request types
pub use requests::{
    AssignRoleRequest, AuditLogQuery, BulkObligationRequest, CreateObligationRequest,
    GuardQuery, InitiatePaymentRequest, InvitationRequest, PaymentDecisionRequest,
    PermissionCheckQuery, RecoveryRequest, SmsAction, SmsVerificationRequest,
    UpsertProfileRequest,
};

// Re-export commonly used response types
pub use responses::{
    ApiResponse, AuditLogResponse, BulkObligationResponse, GuardResponse, HealthChecks,
    HealthResponse, InitiatePaymentResponse, InvitationResponse, MemberSummary,
    ObligationResponse, OrgSummary, PaginatedResponse, PaginationMeta, PermissionCheckResponse,
    PermissionsResponse, ProfileResponse, ReadinessResponse, RecoveryResponse,
    RoleAssignmentResponse, SessionResponse, SmsVerificationResponse, SweepResponse,
    TransactionResponse,
};
