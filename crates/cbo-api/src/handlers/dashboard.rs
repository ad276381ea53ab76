//! Dashboard handlers

use axum::{extract::State, Json};
use cbo_service::dto::{MemberSummary, OrgSummary};
use cbo_service::services::DashboardService;

use crate::extractors::AuthSession;
use crate::response::ApiResult;
use crate::state::AppState;

/// GET /dashboard/summary
pub async fn org_summary(
    State(state): State<AppState>,
    session: AuthSession,
) -> ApiResult<Json<OrgSummary>> {
    let summary = DashboardService::new(state.service_context())
        .org_summary(&session)
        .await?;
    Ok(Json(summary))
}

/// GET /dashboard/me
pub async fn member_summary(
    State(state): State<AppState>,
    session: AuthSession,
) -> ApiResult<Json<MemberSummary>> {
    let summary = DashboardService::new(state.service_context())
        .member_summary(&session)
        .await?;
    Ok(Json(summary))
}
