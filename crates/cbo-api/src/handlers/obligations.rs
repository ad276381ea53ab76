//! Obligation handlers

use axum::{
    extract::{Path, State},
    Json,
};
use cbo_service::dto::{
    BulkObligationRequest, BulkObligationResponse, CreateObligationRequest,
    InitiatePaymentRequest, InitiatePaymentResponse, ObligationResponse, SweepResponse,
};
use cbo_service::services::{ObligationService, PaymentService};

use crate::extractors::{AuthSession, IdPath, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// POST /obligations
pub async fn create_obligation(
    State(state): State<AppState>,
    session: AuthSession,
    ValidatedJson(request): ValidatedJson<CreateObligationRequest>,
) -> ApiResult<Created<Json<ObligationResponse>>> {
    let response = ObligationService::new(state.service_context())
        .create_obligation(&session, request)
        .await?;
    Ok(Created(Json(response)))
}

/// One obligation per member
///
/// POST /obligations/bulk
pub async fn create_bulk(
    State(state): State<AppState>,
    session: AuthSession,
    ValidatedJson(request): ValidatedJson<BulkObligationRequest>,
) -> ApiResult<Created<Json<BulkObligationResponse>>> {
    let response = ObligationService::new(state.service_context())
        .create_for_all_members(&session, request)
        .await?;
    Ok(Created(Json(response)))
}

/// GET /obligations/me
pub async fn list_mine(
    State(state): State<AppState>,
    session: AuthSession,
) -> ApiResult<Json<Vec<ObligationResponse>>> {
    let obligations = ObligationService::new(state.service_context())
        .list_for_member(&session, session.user_id())
        .await?;
    Ok(Json(obligations))
}

/// Mark overdue obligations missed now instead of waiting for the background job
///
/// POST /obligations/sweep
pub async fn sweep(
    State(state): State<AppState>,
    session: AuthSession,
) -> ApiResult<Json<SweepResponse>> {
    let response = ObligationService::new(state.service_context())
        .sweep_requested(&session)
        .await?;
    Ok(Json(response))
}

/// Start paying an obligation
///
/// POST /obligations/{id}/payments
pub async fn initiate_payment(
    State(state): State<AppState>,
    session: AuthSession,
    Path(path): Path<IdPath>,
    ValidatedJson(request): ValidatedJson<InitiatePaymentRequest>,
) -> ApiResult<Created<Json<InitiatePaymentResponse>>> {
    let obligation_id = path.id()?;
    let response = PaymentService::new(state.service_context())
        .initiate(&session, obligation_id, request)
        .await?;
    Ok(Created(Json(response)))
}
