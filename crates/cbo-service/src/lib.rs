//! # cbo-service
//!
//! Application layer containing business logic, services, and DTOs.
//!
//! Every service borrows a [`ServiceContext`] and takes the caller's [`SessionContext`];
//! authorization is checked here, never in the HTTP layer.

pub mod dto;
pub mod services;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use services::{ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult, SessionContext};
