//! Session handlers
//!
//! Session status, route guard decisions and the caller's permissions.

use axum::{
    extract::{Query, State},
    Json,
};
use cbo_service::dto::{
    GuardQuery, GuardResponse, PermissionCheckQuery, PermissionCheckResponse, PermissionsResponse,
    SessionResponse,
};
use cbo_service::services::{RoleService, SessionService};

use crate::extractors::AuthSession;
use crate::response::ApiResult;
use crate::state::AppState;

/// Session status and effective permissions
///
/// GET /session
pub async fn get_session(State(state): State<AppState>, session: AuthSession) -> Json<SessionResponse> {
    Json(SessionService::new(state.service_context()).status(&session))
}

/// Guard decision for a client-side route
///
/// GET /session/guard?path=/dashboard
pub async fn guard_route(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<GuardQuery>,
) -> Json<GuardResponse> {
    Json(SessionService::new(state.service_context()).guard(&session, &query.path))
}

/// GET /me/permissions
pub async fn get_my_permissions(
    State(state): State<AppState>,
    session: AuthSession,
) -> Json<PermissionsResponse> {
    Json(RoleService::new(state.service_context()).my_permissions(&session))
}

/// Check a single permission key for the caller
///
/// GET /permissions/check?permission=approve_payments
pub async fn check_permission(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<PermissionCheckQuery>,
) -> ApiResult<Json<PermissionCheckResponse>> {
    let response = RoleService::new(state.service_context()).check(&session, &query.permission)?;
    Ok(Json(response))
}
