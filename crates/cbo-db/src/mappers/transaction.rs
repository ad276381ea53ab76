//! Payment transaction entity <-> model mapper

use serde_json::Value as JsonValue;

use cbo_core::entities::{FlagReason, PaymentChannel, PaymentTransaction, TransactionStatus};
use cbo_core::error::DomainError;
use cbo_core::value_objects::{Money, PhoneNumber, Snowflake};

use super::corrupt_column;
use crate::models::TransactionModel;

impl TryFrom<TransactionModel> for PaymentTransaction {
    type Error = DomainError;

    fn try_from(model: TransactionModel) -> Result<Self, Self::Error> {
        let channel = PaymentChannel::parse(&model.channel)
            .ok_or_else(|| corrupt_column("payment_transactions.channel", &model.channel))?;
        let status = TransactionStatus::parse(&model.status)
            .ok_or_else(|| corrupt_column("payment_transactions.status", &model.status))?;
        let phone = model
            .phone
            .map(|raw| {
                PhoneNumber::parse(&raw)
                    .map_err(|_| corrupt_column("payment_transactions.phone", &raw))
            })
            .transpose()?;
        let flag_reason = model
            .flag_reason
            .map(|value| {
                serde_json::from_value::<FlagReason>(value.clone()).map_err(|_| {
                    corrupt_column("payment_transactions.flag_reason", &value.to_string())
                })
            })
            .transpose()?;

        Ok(PaymentTransaction {
            id: Snowflake::new(model.id),
            obligation_id: model.obligation_id.map(Snowflake::new),
            payer_id: model.payer_id.map(Snowflake::new),
            channel,
            tracking_id: model.tracking_id,
            amount: Money::from_cents(model.amount_cents),
            reported_amount: model.reported_amount_cents.map(Money::from_cents),
            status,
            phone,
            receipt_number: model.receipt_number,
            proof_url: model.proof_url,
            flag_reason,
            last_error: model.last_error,
            decided_by: model.decided_by.map(Snowflake::new),
            decision_notes: model.decision_notes,
            decided_at: model.decided_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// JSONB form of a flag reason
pub fn flag_reason_to_json(reason: &FlagReason) -> Result<JsonValue, DomainError> {
    serde_json::to_value(reason).map_err(|e| DomainError::InternalError(e.to_string()))
}

/// Transaction values prepared for insertion
pub struct TransactionInsert<'a> {
    pub id: i64,
    pub obligation_id: Option<i64>,
    pub payer_id: Option<i64>,
    pub channel: &'static str,
    pub tracking_id: Option<&'a str>,
    pub amount_cents: i64,
    pub reported_amount_cents: Option<i64>,
    pub status: &'static str,
    pub phone: Option<&'a str>,
    pub receipt_number: Option<&'a str>,
    pub proof_url: Option<&'a str>,
    pub flag_reason: Option<JsonValue>,
}

impl<'a> TransactionInsert<'a> {
    pub fn new(tx: &'a PaymentTransaction) -> Result<Self, DomainError> {
        Ok(Self {
            id: tx.id.into_inner(),
            obligation_id: tx.obligation_id.map(Snowflake::into_inner),
            payer_id: tx.payer_id.map(Snowflake::into_inner),
            channel: tx.channel.as_str(),
            tracking_id: tx.tracking_id.as_deref(),
            amount_cents: tx.amount.cents(),
            reported_amount_cents: tx.reported_amount.map(Money::cents),
            status: tx.status.as_str(),
            phone: tx.phone.as_ref().map(PhoneNumber::as_str),
            receipt_number: tx.receipt_number.as_deref(),
            proof_url: tx.proof_url.as_deref(),
            flag_reason: tx.flag_reason.as_ref().map(flag_reason_to_json).transpose()?,
        })
    }
}
