//! Phone verification handlers

use axum::{extract::State, Json};
use cbo_service::dto::{SmsVerificationRequest, SmsVerificationResponse};
use cbo_service::services::VerificationService;

use crate::extractors::{AuthSession, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// Send a code, or check one
///
/// POST /verification/sms
pub async fn sms_verification(
    State(state): State<AppState>,
    session: AuthSession,
    ValidatedJson(request): ValidatedJson<SmsVerificationRequest>,
) -> ApiResult<Json<SmsVerificationResponse>> {
    let response = VerificationService::new(state.service_context())
        .handle_sms(&session, request)
        .await?;
    Ok(Json(response))
}
