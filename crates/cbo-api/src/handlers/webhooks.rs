//! Payment gateway webhooks
//!
//! These endpoints carry no bearer token and always answer 200 in the shape each gateway
//! expects; failures are handled inside [`WebhookService`].

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    Json,
};
use cbo_integrations::{IpnAck, IpnNotification, MpesaAck};
use cbo_service::services::WebhookService;
use serde_json::Value;
use tracing::warn;

use crate::state::AppState;

/// M-Pesa STK push result
///
/// POST /webhooks/mpesa/{token}
pub async fn mpesa_callback(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Json<MpesaAck> {
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or_else(|e| {
        warn!(error = %e, "M-Pesa callback body is not JSON");
        Value::Null
    });
    let ack = WebhookService::new(state.service_context())
        .handle_mpesa(&token, payload)
        .await;
    Json(ack)
}

/// GET /webhooks/pesapal/ipn?OrderTrackingId=...
pub async fn pesapal_ipn_get(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<IpnAck> {
    pesapal_ipn(&state, &IpnNotification::from_query(query.as_deref())).await
}

/// POST /webhooks/pesapal/ipn
///
/// The body is read raw so a missing content type or an odd shape still gets an ack.
pub async fn pesapal_ipn_post(State(state): State<AppState>, body: Bytes) -> Json<IpnAck> {
    pesapal_ipn(&state, &IpnNotification::from_body(&body)).await
}

async fn pesapal_ipn(state: &AppState, notification: &IpnNotification) -> Json<IpnAck> {
    let ack = WebhookService::new(state.service_context())
        .handle_pesapal_ipn(notification)
        .await;
    Json(ack)
}
