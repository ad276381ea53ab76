//! Audit log handlers

use axum::{
    extract::{Query, State},
    Json,
};
use cbo_service::dto::{AuditLogQuery, AuditLogResponse, PaginatedResponse};
use cbo_service::services::AuditService;

use crate::extractors::AuthSession;
use crate::response::ApiResult;
use crate::state::AppState;

/// Newest entries first
///
/// GET /audit-logs?before={id}&limit={n}
pub async fn list_audit_logs(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<PaginatedResponse<AuditLogResponse>>> {
    let page = AuditService::new(state.service_context())
        .list(&session, query)
        .await?;
    Ok(Json(page))
}
