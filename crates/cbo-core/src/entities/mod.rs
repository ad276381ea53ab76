//! Domain entities - core business objects

mod audit_log;
mod obligation;
mod profile;
mod role_assignment;
mod transaction;

pub use audit_log::{AuditAction, AuditLogEntry};
pub use obligation::{ContributionObligation, ObligationStatus, ObligationType};
pub use profile::Profile;
pub use role_assignment::RoleAssignment;
pub use transaction::{
    FlagReason, PaymentChannel, PaymentDecision, PaymentTransaction, TransactionStatus,
    TransitionCause,
};
