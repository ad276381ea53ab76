//! Service layer error types
//!
//! Provides a unified error type for all service operations.

use cbo_common::error::domain_status;
use cbo_common::AppError;
use cbo_core::DomainError;
use std::fmt;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Domain rule violation
    Domain(DomainError),

    /// Application error (auth, validation, etc.)
    App(AppError),

    /// Resource not found
    NotFound { resource: &'static str, id: String },

    /// Permission denied
    PermissionDenied { permission: String },

    /// Validation error
    Validation(String),

    /// CAPTCHA provider rejected the token
    CaptchaFailed,

    /// Conflict (e.g., duplicate resource)
    Conflict(String),

    /// A remote provider failed; the caller may retry
    External(String),

    /// The provider behind this feature is not configured
    Unavailable { feature: &'static str },

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::App(e) => write!(f, "{e}"),
            Self::NotFound { resource, id } => write!(f, "{resource} not found: {id}"),
            Self::PermissionDenied { permission } => {
                write!(f, "Missing required permission: {permission}")
            }
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::CaptchaFailed => write!(f, "CAPTCHA verification failed"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::External(msg) => write!(f, "External service error: {msg}"),
            Self::Unavailable { feature } => {
                write!(f, "Feature unavailable: {feature} is not configured")
            }
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::App(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a not found error
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::PermissionDenied {
            permission: permission.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an external provider error
    pub fn external(msg: impl Into<String>) -> Self {
        Self::External(msg.into())
    }

    /// Create a feature-unavailable error
    pub fn unavailable(feature: &'static str) -> Self {
        Self::Unavailable { feature }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) => domain_status(e),
            Self::App(e) => e.status_code(),
            Self::NotFound { .. } => 404,
            Self::PermissionDenied { .. } => 403,
            Self::Validation(_) | Self::CaptchaFailed => 400,
            Self::Conflict(_) => 409,
            Self::External(_) => 502,
            Self::Unavailable { .. } => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PermissionDenied { .. } => "MISSING_PERMISSIONS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::CaptchaFailed => "CAPTCHA_FAILED",
            Self::Conflict(_) => "CONFLICT",
            Self::External(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Unavailable { .. } => "FEATURE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether repeating the request later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::External(_) => true,
            Self::Domain(e) => e.is_external(),
            Self::App(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::App(e) => e,
            ServiceError::NotFound { resource, id } => {
                AppError::NotFound(format!("{resource} {id}"))
            }
            ServiceError::PermissionDenied { permission: _ } => {
                AppError::InsufficientPermissions
            }
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::CaptchaFailed => {
                AppError::Validation("CAPTCHA verification failed".to_string())
            }
            ServiceError::Conflict(msg) => AppError::Conflict(msg),
            ServiceError::External(msg) => AppError::ExternalService(msg),
            ServiceError::Unavailable { feature } => AppError::FeatureUnavailable(feature),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cbo_core::Snowflake;

    #[test]
    fn test_not_found_error() {
        let err = ServiceError::not_found("Obligation", "123");
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(err.to_string().contains("Obligation not found: 123"));
    }

    #[test]
    fn test_permission_denied_error() {
        let err = ServiceError::permission_denied("manage_payments");
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "MISSING_PERMISSIONS");
    }

    #[test]
    fn test_captcha_failed_error() {
        let err = ServiceError::CaptchaFailed;
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "CAPTCHA_FAILED");
    }

    #[test]
    fn test_external_error_is_retryable() {
        let err = ServiceError::external("gateway timed out");
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.error_code(), "EXTERNAL_SERVICE_ERROR");
        assert!(err.is_retryable());
        assert!(!ServiceError::validation("bad").is_retryable());
    }

    #[test]
    fn test_unavailable_error() {
        let err = ServiceError::unavailable("sms");
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.error_code(), "FEATURE_UNAVAILABLE");
        assert!(err.to_string().contains("sms"));
    }

    #[test]
    fn test_domain_error_status() {
        let err: ServiceError = DomainError::ObligationNotFound(Snowflake::new(5)).into();
        assert_eq!(err.status_code(), 404);
        let err: ServiceError = DomainError::NotAwaitingApproval.into();
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_convert_to_app_error() {
        let app_err: AppError = ServiceError::unavailable("mpesa").into();
        assert_eq!(app_err.status_code(), 503);
        assert_eq!(app_err.error_code(), "FEATURE_UNAVAILABLE");
    }
}
