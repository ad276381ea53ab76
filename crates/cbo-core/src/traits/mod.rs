//! Ports implemented by the infrastructure crates

mod providers;
mod repositories;

pub use providers::{
    CaptchaVerifier, ChargeRequest, ChargeStarted, EmailMessage, Mailer, PaymentGateway,
    SmsVerifier, StatsCache,
};
pub use repositories::{
    AuditLogRepository, ObligationRepository, ObligationTotals, PaymentRepository,
    ProfileRepository, RepoResult, RoleAssignmentRepository, Settlement, SettlementResult,
    TransactionChange,
};
