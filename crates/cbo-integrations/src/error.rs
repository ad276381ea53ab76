//! Integration error types

use cbo_core::error::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {message}")]
    Rejected {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} sent an unexpected response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    #[error("could not build HTTP client: {0}")]
    Client(reqwest::Error),
}

impl IntegrationError {
    pub fn provider(&self) -> Option<&'static str> {
        match self {
            Self::Http { provider, .. }
            | Self::Rejected { provider, .. }
            | Self::InvalidResponse { provider, .. } => Some(provider),
            Self::Client(_) => None,
        }
    }

    pub(crate) fn invalid(provider: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            message: message.into(),
        }
    }
}

impl From<IntegrationError> for DomainError {
    fn from(e: IntegrationError) -> Self {
        DomainError::ExternalService(e.to_string())
    }
}

pub type IntegrationResult<T> = Result<T, IntegrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_maps_to_external_service() {
        let err = IntegrationError::Rejected {
            provider: "mpesa",
            status: 400,
            message: "Invalid PhoneNumber".to_string(),
        };
        assert_eq!(err.provider(), Some("mpesa"));

        let domain: DomainError = err.into();
        assert!(domain.is_external());
        assert!(domain.to_string().contains("Invalid PhoneNumber"));
    }
}
