//! Service context - dependency container for services
//!
//! Holds the repositories, the stats cache, the outbound providers and the other dependencies
//! needed by services. Providers are optional: a feature whose provider is not configured
//! fails with [`ServiceError::Unavailable`] when used.

use std::sync::Arc;

use cbo_common::auth::JwtService;
use cbo_common::PortalConfig;
use cbo_core::traits::{
    AuditLogRepository, CaptchaVerifier, Mailer, ObligationRepository, PaymentGateway,
    PaymentRepository, ProfileRepository, RoleAssignmentRepository, SmsVerifier, StatsCache,
};
use cbo_core::{PaymentChannel, Snowflake, SnowflakeGenerator};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It provides access to:
/// - Database repositories
/// - The dashboard statistics cache
/// - Payment gateways, SMS, CAPTCHA and email providers (when configured)
/// - JWT service for recovery tokens
/// - Snowflake generator for ID generation
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    profile_repo: Arc<dyn ProfileRepository>,
    role_repo: Arc<dyn RoleAssignmentRepository>,
    obligation_repo: Arc<dyn ObligationRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    audit_repo: Arc<dyn AuditLogRepository>,

    // Cache
    stats_cache: Arc<dyn StatsCache>,

    // Providers
    mpesa: Option<Arc<dyn PaymentGateway>>,
    pesapal: Option<Arc<dyn PaymentGateway>>,
    sms: Option<Arc<dyn SmsVerifier>>,
    captcha: Option<Arc<dyn CaptchaVerifier>>,
    mailer: Option<Arc<dyn Mailer>>,
    mpesa_callback_token: Option<String>,

    // Services
    jwt_service: Arc<JwtService>,
    snowflake_generator: Arc<SnowflakeGenerator>,
    portal: PortalConfig,
}

impl ServiceContext {
    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Repositories ===

    /// Get the profile repository
    pub fn profile_repo(&self) -> &dyn ProfileRepository {
        self.profile_repo.as_ref()
    }

    /// Get the role assignment repository
    pub fn role_repo(&self) -> &dyn RoleAssignmentRepository {
        self.role_repo.as_ref()
    }

    /// Get the obligation repository
    pub fn obligation_repo(&self) -> &dyn ObligationRepository {
        self.obligation_repo.as_ref()
    }

    /// Get the payment transaction repository
    pub fn payment_repo(&self) -> &dyn PaymentRepository {
        self.payment_repo.as_ref()
    }

    /// Get the audit log repository
    pub fn audit_repo(&self) -> &dyn AuditLogRepository {
        self.audit_repo.as_ref()
    }

    // === Cache ===

    /// Get the dashboard statistics cache
    pub fn stats_cache(&self) -> &dyn StatsCache {
        self.stats_cache.as_ref()
    }

    // === Providers ===

    /// Gateway for an API-integrated channel
    pub fn gateway(&self, channel: PaymentChannel) -> ServiceResult<&dyn PaymentGateway> {
        let (gateway, feature) = match channel {
            PaymentChannel::MpesaStk => (self.mpesa.as_deref(), "mpesa"),
            PaymentChannel::Pesapal => (self.pesapal.as_deref(), "pesapal"),
            other => {
                return Err(ServiceError::validation(format!(
                    "{other} payments are verified manually"
                )))
            }
        };
        gateway.ok_or_else(|| ServiceError::unavailable(feature))
    }

    pub fn sms(&self) -> ServiceResult<&dyn SmsVerifier> {
        self.sms
            .as_deref()
            .ok_or_else(|| ServiceError::unavailable("sms"))
    }

    pub fn captcha(&self) -> ServiceResult<&dyn CaptchaVerifier> {
        self.captcha
            .as_deref()
            .ok_or_else(|| ServiceError::unavailable("captcha"))
    }

    pub fn mailer(&self) -> ServiceResult<&dyn Mailer> {
        self.mailer
            .as_deref()
            .ok_or_else(|| ServiceError::unavailable("email"))
    }

    /// Secret path segment M-Pesa must echo on callbacks
    pub fn mpesa_callback_token(&self) -> Option<&str> {
        self.mpesa_callback_token.as_deref()
    }

    // === Services ===

    /// Get the JWT service
    pub fn jwt_service(&self) -> &JwtService {
        self.jwt_service.as_ref()
    }

    /// Get the snowflake ID generator
    pub fn snowflake_generator(&self) -> &SnowflakeGenerator {
        self.snowflake_generator.as_ref()
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }

    /// Portal settings (links, sweep interval, phone country code, cache TTL)
    pub fn portal(&self) -> &PortalConfig {
        &self.portal
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("mpesa", &self.mpesa.is_some())
            .field("pesapal", &self.pesapal.is_some())
            .field("sms", &self.sms.is_some())
            .field("captcha", &self.captcha.is_some())
            .field("mailer", &self.mailer.is_some())
            .field("portal", &self.portal)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
pub struct ServiceContextBuilder {
    profile_repo: Option<Arc<dyn ProfileRepository>>,
    role_repo: Option<Arc<dyn RoleAssignmentRepository>>,
    obligation_repo: Option<Arc<dyn ObligationRepository>>,
    payment_repo: Option<Arc<dyn PaymentRepository>>,
    audit_repo: Option<Arc<dyn AuditLogRepository>>,
    stats_cache: Option<Arc<dyn StatsCache>>,
    mpesa: Option<Arc<dyn PaymentGateway>>,
    pesapal: Option<Arc<dyn PaymentGateway>>,
    sms: Option<Arc<dyn SmsVerifier>>,
    captcha: Option<Arc<dyn CaptchaVerifier>>,
    mailer: Option<Arc<dyn Mailer>>,
    mpesa_callback_token: Option<String>,
    jwt_service: Option<Arc<JwtService>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    portal: Option<PortalConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            profile_repo: None,
            role_repo: None,
            obligation_repo: None,
            payment_repo: None,
            audit_repo: None,
            stats_cache: None,
            mpesa: None,
            pesapal: None,
            sms: None,
            captcha: None,
            mailer: None,
            mpesa_callback_token: None,
            jwt_service: None,
            snowflake_generator: None,
            portal: None,
        }
    }

    pub fn profile_repo(mut self, repo: Arc<dyn ProfileRepository>) -> Self {
        self.profile_repo = Some(repo);
        self
    }

    pub fn role_repo(mut self, repo: Arc<dyn RoleAssignmentRepository>) -> Self {
        self.role_repo = Some(repo);
        self
    }

    pub fn obligation_repo(mut self, repo: Arc<dyn ObligationRepository>) -> Self {
        self.obligation_repo = Some(repo);
        self
    }

    pub fn payment_repo(mut self, repo: Arc<dyn PaymentRepository>) -> Self {
        self.payment_repo = Some(repo);
        self
    }

    pub fn audit_repo(mut self, repo: Arc<dyn AuditLogRepository>) -> Self {
        self.audit_repo = Some(repo);
        self
    }

    pub fn stats_cache(mut self, cache: Arc<dyn StatsCache>) -> Self {
        self.stats_cache = Some(cache);
        self
    }

    /// M-Pesa gateway plus the token its callbacks must carry
    pub fn mpesa(mut self, gateway: Arc<dyn PaymentGateway>, callback_token: String) -> Self {
        self.mpesa = Some(gateway);
        self.mpesa_callback_token = Some(callback_token);
        self
    }

    pub fn pesapal(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.pesapal = Some(gateway);
        self
    }

    pub fn sms(mut self, verifier: Arc<dyn SmsVerifier>) -> Self {
        self.sms = Some(verifier);
        self
    }

    pub fn captcha(mut self, verifier: Arc<dyn CaptchaVerifier>) -> Self {
        self.captcha = Some(verifier);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn jwt_service(mut self, service: Arc<JwtService>) -> Self {
        self.jwt_service = Some(service);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn portal(mut self, portal: PortalConfig) -> Self {
        self.portal = Some(portal);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext {
            profile_repo: self
                .profile_repo
                .ok_or_else(|| ServiceError::validation("profile_repo is required"))?,
            role_repo: self
                .role_repo
                .ok_or_else(|| ServiceError::validation("role_repo is required"))?,
            obligation_repo: self
                .obligation_repo
                .ok_or_else(|| ServiceError::validation("obligation_repo is required"))?,
            payment_repo: self
                .payment_repo
                .ok_or_else(|| ServiceError::validation("payment_repo is required"))?,
            audit_repo: self
                .audit_repo
                .ok_or_else(|| ServiceError::validation("audit_repo is required"))?,
            stats_cache: self
                .stats_cache
                .ok_or_else(|| ServiceError::validation("stats_cache is required"))?,
            mpesa: self.mpesa,
            pesapal: self.pesapal,
            sms: self.sms,
            captcha: self.captcha,
            mailer: self.mailer,
            mpesa_callback_token: self.mpesa_callback_token,
            jwt_service: self
                .jwt_service
                .ok_or_else(|| ServiceError::validation("jwt_service is required"))?,
            snowflake_generator: self
                .snowflake_generator
                .ok_or_else(|| ServiceError::validation("snowflake_generator is required"))?,
            portal: self
                .portal
                .ok_or_else(|| ServiceError::validation("portal is required"))?,
        })
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
