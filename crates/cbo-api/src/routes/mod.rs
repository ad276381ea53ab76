//! Route definitions
//!
//! Member-facing routes are mounted under /api/v1. Health and webhook routes are exported
//! separately so they bypass rate limiting.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{
    audit, dashboard, health, members, obligations, payments, profile, recovery, session,
    verification, webhooks,
};
use crate::state::AppState;

/// Create the main API router
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// Gateway callbacks
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks/mpesa/:token", post(webhooks::mpesa_callback))
        .route(
            "/webhooks/pesapal/ipn",
            get(webhooks::pesapal_ipn_get).post(webhooks::pesapal_ipn_post),
        )
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(session_routes())
        .merge(member_routes())
        .merge(obligation_routes())
        .merge(payment_routes())
        .merge(report_routes())
        .merge(account_routes())
}

fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/session", get(session::get_session))
        .route("/session/guard", get(session::guard_route))
        .route("/me/permissions", get(session::get_my_permissions))
        .route("/permissions/check", get(session::check_permission))
        .route("/profile", get(profile::get_profile).put(profile::upsert_profile))
}

fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/members/invitations", post(members::invite_member))
        .route(
            "/members/:user_id/roles",
            get(members::list_roles).post(members::assign_role),
        )
        .route("/members/:user_id/roles/:role", delete(members::supersede_role))
        .route("/members/:user_id/obligations", get(members::list_obligations))
}

fn obligation_routes() -> Router<AppState> {
    Router::new()
        .route("/obligations", post(obligations::create_obligation))
        .route("/obligations/bulk", post(obligations::create_bulk))
        .route("/obligations/me", get(obligations::list_mine))
        .route("/obligations/sweep", post(obligations::sweep))
        .route("/obligations/:id/payments", post(obligations::initiate_payment))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/pending-approval", get(payments::list_pending_approval))
        .route("/payments/:id", get(payments::get_payment))
        .route("/payments/:id/decision", post(payments::decide))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/summary", get(dashboard::org_summary))
        .route("/dashboard/me", get(dashboard::member_summary))
        .route("/audit-logs", get(audit::list_audit_logs))
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/verification/sms", post(verification::sms_verification))
        .route("/auth/recover", post(recovery::request_recovery))
}
