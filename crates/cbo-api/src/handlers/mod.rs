//! Route handlers
//!
//! All HTTP request handlers organized by domain.

pub mod audit;
pub mod dashboard;
pub mod health;
pub mod members;
pub mod obligations;
pub mod payments;
pub mod profile;
pub mod recovery;
pub mod session;
pub mod verification;
pub mod webhooks;
