//! Webhook service
//!
//! Authenticates gateway callbacks and hands the result to reconciliation. Gateways always
//! receive their acknowledgement shape; internal failures are logged and recorded in the audit
//! log instead of being returned to the caller.

use cbo_core::{AuditAction, AuditLogEntry, PaymentChannel};
use cbo_integrations::{tokens_match, IpnAck, IpnNotification, MpesaAck, StkCallbackEnvelope};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::reconciliation::{ReconcileOutcome, ReconciliationService};

/// Webhook service
pub struct WebhookService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> WebhookService<'a> {
    /// Create a new WebhookService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Daraja STK push callback
    #[instrument(skip_all)]
    pub async fn handle_mpesa(&self, presented_token: &str, payload: Value) -> MpesaAck {
        let Some(expected) = self.ctx.mpesa_callback_token() else {
            warn!("M-Pesa callback received but M-Pesa is not configured");
            return MpesaAck::accepted();
        };
        if !tokens_match(expected, presented_token) {
            warn!("M-Pesa callback with invalid token ignored");
            return MpesaAck::accepted();
        }

        let envelope: StkCallbackEnvelope = match serde_json::from_value(payload.clone()) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.record_failure(
                    PaymentChannel::MpesaStk,
                    None,
                    &format!("unreadable callback: {e}"),
                    payload,
                )
                .await;
                return MpesaAck::accepted();
            }
        };

        let result = envelope.into_gateway_result(payload);
        let tracking_id = result.tracking_id.clone();
        match ReconciliationService::new(self.ctx).reconcile(&result).await {
            Ok(outcome) => log_outcome(PaymentChannel::MpesaStk, &outcome),
            Err(e) => {
                self.record_failure(
                    PaymentChannel::MpesaStk,
                    Some(&tracking_id),
                    &e.to_string(),
                    result.raw,
                )
                .await;
            }
        }

        MpesaAck::accepted()
    }

    /// Pesapal IPN. The notification is only a hint; the status query is authoritative.
    #[instrument(skip_all, fields(tracking_id = %notification.order_tracking_id))]
    pub async fn handle_pesapal_ipn(&self, notification: &IpnNotification) -> IpnAck {
        match self.process_ipn(notification).await {
            Ok(()) => IpnAck::new(notification, true),
            Err(e) => {
                let tracking_id = Some(notification.order_tracking_id.trim()).filter(|t| !t.is_empty());
                self.record_failure(
                    PaymentChannel::Pesapal,
                    tracking_id,
                    &e.to_string(),
                    json!({
                        "OrderTrackingId": notification.order_tracking_id,
                        "OrderNotificationType": notification.order_notification_type,
                        "OrderMerchantReference": notification.order_merchant_reference,
                    }),
                )
                .await;
                // 500 asks Pesapal to notify again later
                IpnAck::new(notification, false)
            }
        }
    }

    async fn process_ipn(&self, notification: &IpnNotification) -> ServiceResult<()> {
        let tracking_id = notification.order_tracking_id.trim();
        if tracking_id.is_empty() {
            return Err(ServiceError::validation("OrderTrackingId is required"));
        }

        let gateway = self.ctx.gateway(PaymentChannel::Pesapal)?;
        let Some(result) = gateway.query_status(tracking_id).await? else {
            info!("Pesapal order still in flight");
            return Ok(());
        };

        let outcome = ReconciliationService::new(self.ctx).reconcile(&result).await?;
        log_outcome(PaymentChannel::Pesapal, &outcome);
        Ok(())
    }

    async fn record_failure(
        &self,
        channel: PaymentChannel,
        tracking_id: Option<&str>,
        reason: &str,
        payload: Value,
    ) {
        error!(channel = %channel, tracking_id, reason, "Webhook processing failed");

        let mut entry = AuditLogEntry::new(
            self.ctx.generate_id(),
            AuditAction::WebhookProcessingFailed,
            format!("{channel} webhook could not be processed"),
        )
        .metadata(json!({
            "channel": channel.as_str(),
            "reason": reason,
            "payload": payload,
        }));
        if let Some(tracking_id) = tracking_id {
            entry = entry.target("payment_tracking_id", tracking_id);
        }

        if let Err(e) = self.ctx.audit_repo().append(&entry).await {
            error!(error = %e, "Failed to record webhook failure");
        }
    }
}

fn log_outcome(channel: PaymentChannel, outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::Duplicate { transaction_id } => {
            info!(channel = %channel, transaction_id = %transaction_id, "Duplicate delivery acknowledged");
        }
        other => info!(channel = %channel, outcome = ?other, "Webhook processed"),
    }
}
