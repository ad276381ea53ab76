//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in cbo-core.
//! Writes that carry an audit entry insert it inside the same transaction.

mod audit_log;
mod error;
mod obligation;
mod payment;
mod profile;
mod role_assignment;

pub use audit_log::PgAuditLogRepository;
pub use obligation::PgObligationRepository;
pub use payment::PgPaymentRepository;
pub use profile::PgProfileRepository;
pub use role_assignment::PgRoleAssignmentRepository;
