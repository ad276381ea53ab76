//! Payment transaction database model

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// Database model for the payment_transactions table
#[derive(Debug, Clone, FromRow)]
pub struct TransactionModel {
    pub id: i64,
    pub obligation_id: Option<i64>,
    pub payer_id: Option<i64>,
    pub channel: String,
    pub tracking_id: Option<String>,
    pub amount_cents: i64,
    pub reported_amount_cents: Option<i64>,
    pub status: String,
    pub phone: Option<String>,
    pub receipt_number: Option<String>,
    pub proof_url: Option<String>,
    pub flag_reason: Option<JsonValue>,
    pub last_error: Option<String>,
    pub decided_by: Option<i64>,
    pub decision_notes: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
