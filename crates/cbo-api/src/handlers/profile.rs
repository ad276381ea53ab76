//! Profile handlers

use axum::{extract::State, Json};
use cbo_service::dto::{ProfileResponse, UpsertProfileRequest};
use cbo_service::services::ProfileService;

use crate::extractors::{AuthSession, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// GET /profile
pub async fn get_profile(
    State(state): State<AppState>,
    session: AuthSession,
) -> ApiResult<Json<ProfileResponse>> {
    let response = ProfileService::new(state.service_context())
        .get_own_profile(&session)
        .await?;
    Ok(Json(response))
}

/// Create or update the caller's profile
///
/// PUT /profile
pub async fn upsert_profile(
    State(state): State<AppState>,
    session: AuthSession,
    ValidatedJson(request): ValidatedJson<UpsertProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let response = ProfileService::new(state.service_context())
        .upsert_own_profile(&session, request)
        .await?;
    Ok(Json(response))
}
