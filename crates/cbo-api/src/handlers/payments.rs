//! Payment handlers
//!
//! The approval queue and manual decisions. Gateway callbacks live in [`super::webhooks`].

use axum::{
    extract::{Path, State},
    Json,
};
use cbo_service::dto::{PaymentDecisionRequest, TransactionResponse};
use cbo_service::services::PaymentService;

use crate::extractors::{AuthSession, IdPath, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// GET /payments/pending-approval
pub async fn list_pending_approval(
    State(state): State<AppState>,
    session: AuthSession,
) -> ApiResult<Json<Vec<TransactionResponse>>> {
    let transactions = PaymentService::new(state.service_context())
        .list_awaiting_approval(&session)
        .await?;
    Ok(Json(transactions))
}

/// GET /payments/{id}
pub async fn get_payment(
    State(state): State<AppState>,
    session: AuthSession,
    Path(path): Path<IdPath>,
) -> ApiResult<Json<TransactionResponse>> {
    let transaction_id = path.id()?;
    let response = PaymentService::new(state.service_context())
        .get(&session, transaction_id)
        .await?;
    Ok(Json(response))
}

/// Approve or reject a payment awaiting approval
///
/// POST /payments/{id}/decision
pub async fn decide(
    State(state): State<AppState>,
    session: AuthSession,
    Path(path): Path<IdPath>,
    ValidatedJson(request): ValidatedJson<PaymentDecisionRequest>,
) -> ApiResult<Json<TransactionResponse>> {
    let transaction_id = path.id()?;
    let response = PaymentService::new(state.service_context())
        .decide(&session, transaction_id, request)
        .await?;
    Ok(Json(response))
}
