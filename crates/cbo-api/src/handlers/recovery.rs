//! Account recovery handler
//!
//! Unauthenticated; protected by CAPTCHA and the rate limiter.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use cbo_service::dto::{RecoveryRequest, RecoveryResponse};
use cbo_service::services::RecoveryService;

use crate::extractors::ValidatedJson;
use crate::response::{Accepted, ApiResult};
use crate::state::AppState;

/// POST /auth/recover
pub async fn request_recovery(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<RecoveryRequest>,
) -> ApiResult<Accepted<Json<RecoveryResponse>>> {
    let remote_ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let response = RecoveryService::new(state.service_context())
        .request_recovery(request, remote_ip.as_deref())
        .await?;
    Ok(Accepted(Json(response)))
}

/// First `X-Forwarded-For` hop, else the socket peer
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}
