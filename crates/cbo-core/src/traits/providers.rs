//! Outbound provider traits: payment gateways, SMS, CAPTCHA, email and the stats cache
//!
//! Implementations report remote failures as [`DomainError::ExternalService`].

use async_trait::async_trait;

use crate::entities::PaymentChannel;
use crate::error::DomainError;
use crate::reconciliation::GatewayResult;
use crate::value_objects::{Money, PhoneNumber, Snowflake};

// ============================================================================
// Payment gateways
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    pub transaction_id: Snowflake,
    pub obligation_id: Snowflake,
    pub amount: Money,
    pub phone: Option<PhoneNumber>,
    pub email: Option<String>,
    pub payer_name: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeStarted {
    /// Gateway-issued id later echoed by callbacks
    pub tracking_id: String,
    /// Hosted checkout page, for redirect-style gateways
    pub redirect_url: Option<String>,
    pub message: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn channel(&self) -> PaymentChannel;

    /// Ask the gateway to start collecting `request.amount`
    async fn start_charge(&self, request: &ChargeRequest) -> Result<ChargeStarted, DomainError>;

    /// Authoritative status of a charge; `None` while it is still in flight
    async fn query_status(&self, tracking_id: &str) -> Result<Option<GatewayResult>, DomainError>;
}

// ============================================================================
// Verification and messaging
// ============================================================================

#[async_trait]
pub trait SmsVerifier: Send + Sync {
    /// Send a one-time code; returns the provider's status string
    async fn send_code(&self, phone: &PhoneNumber) -> Result<String, DomainError>;

    /// Whether `code` is correct for `phone`
    async fn check_code(&self, phone: &PhoneNumber, code: &str) -> Result<bool, DomainError>;
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, DomainError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError>;
}

// ============================================================================
// Stats cache
// ============================================================================

/// Key/value store for serialized dashboard statistics
#[async_trait]
pub trait StatsCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), DomainError>;

    async fn invalidate(&self, keys: &[String]) -> Result<(), DomainError>;
}
