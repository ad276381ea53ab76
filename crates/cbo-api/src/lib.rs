//! # cbo-api
//!
//! REST API server built with the Axum framework: member-facing routes under `/api/v1`,
//! gateway webhooks under `/webhooks`, health probes, and the background sweep job.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run, spawn_sweep_job};
pub use state::AppState;
