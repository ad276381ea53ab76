//! Normalized outcome of a payment reported by a gateway

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::PaymentChannel;
use crate::value_objects::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayOutcome {
    Success,
    Failed,
    Timeout,
    Cancelled,
}

impl GatewayOutcome {
    /// Map a provider status string or code to an outcome.
    ///
    /// Returns `None` for non-final statuses ("pending", "processing") and unknown values,
    /// which must not move a transaction.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" | "successful" | "completed" | "complete" | "confirmed" | "paid" => {
                Some(Self::Success)
            }
            "failed" | "failure" | "reversed" | "invalid" | "declined" | "error" => {
                Some(Self::Failed)
            }
            "cancelled" | "canceled" | "1032" => Some(Self::Cancelled),
            "timeout" | "timed_out" | "expired" | "1037" => Some(Self::Timeout),
            _ => None,
        }
    }

    /// M-Pesa STK `ResultCode`
    pub fn from_mpesa_result_code(code: i64) -> Self {
        match code {
            0 => Self::Success,
            1032 => Self::Cancelled,
            1037 => Self::Timeout,
            _ => Self::Failed,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// What a gateway told us about one charge
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResult {
    pub channel: PaymentChannel,
    pub tracking_id: String,
    pub outcome: GatewayOutcome,
    /// Amount the gateway says was paid
    pub amount: Option<Money>,
    pub receipt: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    /// Original payload, kept for the audit trail
    pub raw: Value,
}

impl GatewayResult {
    pub fn new(channel: PaymentChannel, tracking_id: impl Into<String>, outcome: GatewayOutcome) -> Self {
        Self {
            channel,
            tracking_id: tracking_id.into(),
            outcome,
            amount: None,
            receipt: None,
            phone: None,
            description: None,
            raw: Value::Null,
        }
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt = Some(receipt.into());
        self
    }
}
