//! Integration test utilities for the membership portal
//!
//! This crate provides helpers for running end-to-end tests against
//! the REST API backed by real PostgreSQL and Redis instances.

pub mod helpers;
pub mod fixtures;

pub use helpers::*;
pub use fixtures::*;
