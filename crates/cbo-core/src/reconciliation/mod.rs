//! Matching gateway payment reports to transactions

mod gateway_result;
mod plan;

pub use gateway_result::{GatewayOutcome, GatewayResult};
pub use plan::{is_duplicate_delivery, plan_reconciliation, ReconcilePlan};
