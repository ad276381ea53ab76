//! Database models - SQLx-compatible structs for PostgreSQL tables

mod audit_log;
mod obligation;
mod profile;
mod role_assignment;
mod transaction;

pub use audit_log::AuditLogModel;
pub use obligation::{ObligationModel, ObligationTotalsModel};
pub use profile::ProfileModel;
pub use role_assignment::RoleAssignmentModel;
pub use transaction::TransactionModel;
