//! # cbo-db
//!
//! Database layer implementing the `cbo-core` repository traits with PostgreSQL via SQLx.
//!
//! - Connection pool management and migrations
//! - Row models with SQLx `FromRow` derives
//! - Model → entity mappers
//! - Repository implementations
//!
//! ```rust,ignore
//! use cbo_db::{create_pool, run_migrations, DatabaseConfig, PgPaymentRepository};
//!
//! let pool = create_pool(&DatabaseConfig::from(&app_config.database)).await?;
//! run_migrations(&pool).await?;
//! let payments = PgPaymentRepository::new(pool.clone());
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{
    PgAuditLogRepository, PgObligationRepository, PgPaymentRepository, PgProfileRepository,
    PgRoleAssignmentRepository,
};
