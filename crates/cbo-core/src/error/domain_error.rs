//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::TransactionStatus;
use crate::value_objects::{InvalidPhoneNumber, MemberRole, Snowflake, UnknownRole};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Profile not found: {0}")]
    ProfileNotFound(Snowflake),

    #[error("Obligation not found: {0}")]
    ObligationNotFound(Snowflake),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Role assignment not found: {role} for {user_id}")]
    RoleAssignmentNotFound { user_id: Snowflake, role: MemberRole },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    #[error("Obligation belongs to another member")]
    NotObligationOwner,

    #[error("Cannot remove your own admin role")]
    CannotSupersedeOwnAdmin,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Role already assigned: {0}")]
    RoleAlreadyAssigned(MemberRole),

    #[error("Tracking id already recorded: {0}")]
    DuplicateTrackingId(String),

    #[error("Obligation already paid")]
    ObligationAlreadyPaid,

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Invalid transaction transition: {from} -> {to}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Transaction is not awaiting approval")]
    NotAwaitingApproval,

    #[error("Obligation is not payable in status {0}")]
    ObligationNotPayable(String),

    // =========================================================================
    // External / Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::ProfileNotFound(_) => "UNKNOWN_PROFILE",
            Self::ObligationNotFound(_) => "UNKNOWN_OBLIGATION",
            Self::TransactionNotFound(_) => "UNKNOWN_TRANSACTION",
            Self::RoleAssignmentNotFound { .. } => "UNKNOWN_ROLE_ASSIGNMENT",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidPhoneNumber(_) => "INVALID_PHONE_NUMBER",
            Self::UnknownPermission(_) => "UNKNOWN_PERMISSION",
            Self::UnknownRole(_) => "UNKNOWN_ROLE",

            // Authorization
            Self::MissingPermission(_) => "MISSING_PERMISSIONS",
            Self::NotObligationOwner => "NOT_OBLIGATION_OWNER",
            Self::CannotSupersedeOwnAdmin => "CANNOT_SUPERSEDE_OWN_ADMIN",

            // Conflict
            Self::RoleAlreadyAssigned(_) => "ROLE_ALREADY_ASSIGNED",
            Self::DuplicateTrackingId(_) => "DUPLICATE_TRACKING_ID",
            Self::ObligationAlreadyPaid => "OBLIGATION_ALREADY_PAID",

            // Business Rules
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotAwaitingApproval => "NOT_AWAITING_APPROVAL",
            Self::ObligationNotPayable(_) => "OBLIGATION_NOT_PAYABLE",

            // External / Infrastructure
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProfileNotFound(_)
                | Self::ObligationNotFound(_)
                | Self::TransactionNotFound(_)
                | Self::RoleAssignmentNotFound { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::InvalidAmount
                | Self::InvalidPhoneNumber(_)
                | Self::UnknownPermission(_)
                | Self::UnknownRole(_)
        )
    }

    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::MissingPermission(_) | Self::NotObligationOwner | Self::CannotSupersedeOwnAdmin
        )
    }

    /// Conflicts and business-rule violations both surface as 409
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::RoleAlreadyAssigned(_)
                | Self::DuplicateTrackingId(_)
                | Self::ObligationAlreadyPaid
                | Self::InvalidTransition { .. }
                | Self::NotAwaitingApproval
                | Self::ObligationNotPayable(_)
        )
    }

    /// Failure of a remote provider; the caller may retry
    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalService(_))
    }
}

impl From<InvalidPhoneNumber> for DomainError {
    fn from(err: InvalidPhoneNumber) -> Self {
        Self::InvalidPhoneNumber(err.0)
    }
}

impl From<UnknownRole> for DomainError {
    fn from(err: UnknownRole) -> Self {
        Self::UnknownRole(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            DomainError::ObligationNotFound(Snowflake::new(1)).code(),
            "UNKNOWN_OBLIGATION"
        );
        assert_eq!(
            DomainError::MissingPermission("approve_payments".into()).code(),
            "MISSING_PERMISSIONS"
        );
        assert_eq!(
            DomainError::ExternalService("mpesa".into()).code(),
            "EXTERNAL_SERVICE_ERROR"
        );
    }

    #[test]
    fn test_categories_are_disjoint() {
        let samples = [
            DomainError::ProfileNotFound(Snowflake::new(1)),
            DomainError::InvalidAmount,
            DomainError::NotObligationOwner,
            DomainError::DuplicateTrackingId("X1".into()),
            DomainError::ExternalService("down".into()),
        ];
        for err in &samples {
            let hits = [
                err.is_not_found(),
                err.is_validation(),
                err.is_authorization(),
                err.is_conflict(),
                err.is_external(),
            ]
            .into_iter()
            .filter(|b| *b)
            .count();
            assert_eq!(hits, 1, "{err}");
        }
    }

    #[test]
    fn test_transition_display() {
        let err = DomainError::InvalidTransition {
            from: TransactionStatus::Completed,
            to: TransactionStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Invalid transaction transition: completed -> pending"
        );
    }

    #[test]
    fn test_from_phone_error() {
        let err: DomainError = InvalidPhoneNumber("12".into()).into();
        assert!(err.is_validation());
    }
}
