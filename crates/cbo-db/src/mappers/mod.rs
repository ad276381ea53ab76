//! Model to entity mappers
//!
//! - `TryFrom<Model> for Entity`: convert rows to domain objects. Text columns holding enum
//!   values are parsed back; a value the domain does not know is reported as a database error.
//! - `*Insert` structs: flatten entity data for binding

mod audit_log;
mod obligation;
mod profile;
mod role_assignment;
mod transaction;

pub use audit_log::AuditLogInsert;
pub use obligation::ObligationInsert;
pub use transaction::{flag_reason_to_json, TransactionInsert};

use cbo_core::error::DomainError;

/// Error for a stored value that does not parse into its domain type
pub(crate) fn corrupt_column(column: &str, value: &str) -> DomainError {
    DomainError::DatabaseError(format!("unexpected value {value:?} in column {column}"))
}
