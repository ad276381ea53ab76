//! Business logic services
//!
//! This module contains all service layer implementations that handle
//! business logic, validation, and orchestration of domain operations.

pub mod audit;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod invitation;
pub mod obligation;
pub mod payment;
pub mod permission;
pub mod profile;
pub mod reconciliation;
pub mod recovery;
pub mod role;
pub mod session;
pub mod verification;
pub mod webhook;

// Re-export all services for convenience
pub use audit::AuditService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use dashboard::{collection_rate, DashboardService};
pub use error::{ServiceError, ServiceResult};
pub use invitation::InvitationService;
pub use obligation::ObligationService;
pub use payment::PaymentService;
pub use permission::{parse_permission_key, PermissionService};
pub use profile::ProfileService;
pub use reconciliation::{ReconcileOutcome, ReconciliationService};
pub use recovery::RecoveryService;
pub use role::RoleService;
pub use session::{SessionContext, SessionService};
pub use verification::VerificationService;
pub use webhook::WebhookService;
