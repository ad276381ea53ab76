//! # cbo-core
//!
//! Domain layer for the membership portal: entities, value objects, the role/permission
//! evaluator, the payment transaction state machine, the reconciliation planner, the session
//! guard, and the repository/provider traits implemented by the infrastructure crates.
//! This crate performs no I/O.

pub mod authorization;
pub mod entities;
pub mod error;
pub mod reconciliation;
pub mod session;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use authorization::{effective_permissions, has_permission, RoleSet};
pub use entities::{
    AuditAction, AuditLogEntry, ContributionObligation, FlagReason, ObligationStatus,
    ObligationType, PaymentChannel, PaymentDecision, PaymentTransaction, Profile,
    RoleAssignment, TransactionStatus, TransitionCause,
};
pub use error::DomainError;
pub use reconciliation::{
    is_duplicate_delivery, plan_reconciliation, GatewayOutcome, GatewayResult, ReconcilePlan,
};
pub use session::{guard, route_kind, GuardDecision, RouteKind, SessionSignals, SessionStatus};
pub use traits::{
    AuditLogRepository, CaptchaVerifier, ChargeRequest, ChargeStarted, EmailMessage, Mailer,
    ObligationRepository, ObligationTotals, PaymentGateway, PaymentRepository,
    ProfileRepository, RepoResult, RoleAssignmentRepository, Settlement, SettlementResult,
    SmsVerifier, StatsCache, TransactionChange,
};
pub use value_objects::{
    InvalidPhoneNumber, MemberRole, Money, Permissions, PhoneNumber, Snowflake,
    SnowflakeGenerator, SnowflakeParseError, UnknownRole,
};
