//! Payment transaction entity and its state machine
//!
//! ```text
//! pending ──gateway──▶ completed | failed | timeout | awaiting_approval (flagged)
//! awaiting_approval ──decision──▶ completed | rejected
//! ```
//!
//! Every other move is rejected. Terminal states never change again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::value_objects::{Money, PhoneNumber, Snowflake};

// ============================================================================
// Channel
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    /// M-Pesa STK push (Daraja)
    MpesaStk,
    /// Pesapal hosted checkout
    Pesapal,
    /// Paybill/till payment confirmed by hand
    Till,
    BankTransfer,
    Cash,
}

impl PaymentChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MpesaStk => "mpesa_stk",
            Self::Pesapal => "pesapal",
            Self::Till => "till",
            Self::BankTransfer => "bank_transfer",
            Self::Cash => "cash",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mpesa_stk" => Some(Self::MpesaStk),
            "pesapal" => Some(Self::Pesapal),
            "till" => Some(Self::Till),
            "bank_transfer" => Some(Self::BankTransfer),
            "cash" => Some(Self::Cash),
            _ => None,
        }
    }

    /// Confirmed by a gateway callback rather than by a treasurer
    #[inline]
    pub fn is_api_integrated(&self) -> bool {
        matches!(self, Self::MpesaStk | Self::Pesapal)
    }

    /// Status a fresh transaction on this channel starts in
    pub fn initial_status(&self) -> TransactionStatus {
        if self.is_api_integrated() {
            TransactionStatus::Pending
        } else {
            TransactionStatus::AwaitingApproval
        }
    }
}

impl fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    AwaitingApproval,
    Completed,
    Failed,
    Rejected,
    Timeout,
}

/// Who is driving a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    /// A verified gateway callback or status query
    Gateway,
    /// A treasurer/admin approve-or-reject decision
    Decision,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
            Self::Timeout => "timeout",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "awaiting_approval" => Some(Self::AwaitingApproval),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "rejected" => Some(Self::Rejected),
            "timeout" => Some(Self::Timeout),
            _ => None,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Rejected | Self::Timeout
        )
    }

    pub fn can_transition_to(&self, next: TransactionStatus, cause: TransitionCause) -> bool {
        use TransactionStatus::{AwaitingApproval, Completed, Failed, Pending, Rejected, Timeout};
        match (self, cause) {
            (Pending, TransitionCause::Gateway) => {
                matches!(next, Completed | Failed | Timeout | AwaitingApproval)
            }
            (AwaitingApproval, TransitionCause::Decision) => matches!(next, Completed | Rejected),
            _ => false,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Flags and decisions
// ============================================================================

/// Why a transaction was routed to manual review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlagReason {
    AmountMismatch { expected: Money, reported: Money },
    /// A success report without an amount to compare
    AmountUnreported { expected: Money },
    /// The gateway reported a payment nobody initiated here
    UnmatchedCallback,
}

impl FlagReason {
    pub fn describe(&self) -> String {
        match self {
            Self::AmountMismatch { expected, reported } => {
                format!("gateway reported {reported} against an obligation of {expected}")
            }
            Self::AmountUnreported { expected } => {
                format!("gateway reported success without an amount; {expected} expected")
            }
            Self::UnmatchedCallback => "callback did not match any initiated payment".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDecision {
    Approved,
    Rejected,
}

impl PaymentDecision {
    pub fn target_status(&self) -> TransactionStatus {
        match self {
            Self::Approved => TransactionStatus::Completed,
            Self::Rejected => TransactionStatus::Rejected,
        }
    }
}

// ============================================================================
// Entity
// ============================================================================

/// One attempt to satisfy an obligation through a payment channel
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentTransaction {
    pub id: Snowflake,
    /// None for unsolicited callbacks that matched nothing
    pub obligation_id: Option<Snowflake>,
    pub payer_id: Option<Snowflake>,
    pub channel: PaymentChannel,
    /// Gateway-issued id (or the receipt number for manual channels); unique
    pub tracking_id: Option<String>,
    pub amount: Money,
    /// Amount the gateway reported, when it differs from what was charged
    pub reported_amount: Option<Money>,
    pub status: TransactionStatus,
    pub phone: Option<PhoneNumber>,
    pub receipt_number: Option<String>,
    pub proof_url: Option<String>,
    pub flag_reason: Option<FlagReason>,
    pub last_error: Option<String>,
    pub decided_by: Option<Snowflake>,
    pub decision_notes: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentTransaction {
    /// New attempt against an obligation, starting in the channel's initial status
    pub fn initiate(
        id: Snowflake,
        obligation_id: Snowflake,
        payer_id: Snowflake,
        channel: PaymentChannel,
        amount: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            obligation_id: Some(obligation_id),
            payer_id: Some(payer_id),
            channel,
            tracking_id: None,
            amount,
            reported_amount: None,
            status: channel.initial_status(),
            phone: None,
            receipt_number: None,
            proof_url: None,
            flag_reason: None,
            last_error: None,
            decided_by: None,
            decision_notes: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Payment reported by a gateway that matches no known transaction
    pub fn unsolicited(
        id: Snowflake,
        channel: PaymentChannel,
        tracking_id: String,
        amount: Money,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            obligation_id: None,
            payer_id: None,
            channel,
            tracking_id: Some(tracking_id),
            amount,
            reported_amount: Some(amount),
            status: TransactionStatus::AwaitingApproval,
            phone: None,
            receipt_number: None,
            proof_url: None,
            flag_reason: Some(FlagReason::UnmatchedCallback),
            last_error: None,
            decided_by: None,
            decision_notes: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `next`, enforcing the state machine
    pub fn transition(
        &mut self,
        next: TransactionStatus,
        cause: TransitionCause,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next, cause) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Reference stamped on the obligation when this transaction credits it
    pub fn reference(&self) -> String {
        self.receipt_number
            .clone()
            .or_else(|| self.tracking_id.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TransactionStatus; 6] = [
        TransactionStatus::Pending,
        TransactionStatus::AwaitingApproval,
        TransactionStatus::Completed,
        TransactionStatus::Failed,
        TransactionStatus::Rejected,
        TransactionStatus::Timeout,
    ];

    fn tx(channel: PaymentChannel) -> PaymentTransaction {
        PaymentTransaction::initiate(
            Snowflake::new(1),
            Snowflake::new(2),
            Snowflake::new(3),
            channel,
            Money::from_cents(100_000),
        )
    }

    #[test]
    fn test_initial_status_by_channel() {
        assert_eq!(tx(PaymentChannel::MpesaStk).status, TransactionStatus::Pending);
        assert_eq!(tx(PaymentChannel::Pesapal).status, TransactionStatus::Pending);
        for channel in [
            PaymentChannel::Till,
            PaymentChannel::BankTransfer,
            PaymentChannel::Cash,
        ] {
            assert_eq!(tx(channel).status, TransactionStatus::AwaitingApproval);
        }
    }

    #[test]
    fn test_terminal_states_never_move() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                for cause in [TransitionCause::Gateway, TransitionCause::Decision] {
                    assert!(!from.can_transition_to(to, cause), "{from} -> {to}");
                }
            }
        }
    }

    #[test]
    fn test_completion_from_awaiting_approval_needs_decision() {
        let s = TransactionStatus::AwaitingApproval;
        assert!(!s.can_transition_to(TransactionStatus::Completed, TransitionCause::Gateway));
        assert!(s.can_transition_to(TransactionStatus::Completed, TransitionCause::Decision));
        assert!(s.can_transition_to(TransactionStatus::Rejected, TransitionCause::Decision));
        assert!(!s.can_transition_to(TransactionStatus::Failed, TransitionCause::Decision));
    }

    #[test]
    fn test_decision_cannot_move_pending() {
        let s = TransactionStatus::Pending;
        for to in ALL {
            assert!(!s.can_transition_to(to, TransitionCause::Decision));
        }
    }

    #[test]
    fn test_transition_errors_name_both_states() {
        let mut t = tx(PaymentChannel::MpesaStk);
        t.transition(TransactionStatus::Completed, TransitionCause::Gateway)
            .unwrap();
        let err = t
            .transition(TransactionStatus::Failed, TransitionCause::Gateway)
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: TransactionStatus::Completed,
                to: TransactionStatus::Failed
            }
        ));
    }

    #[test]
    fn test_status_strings_round_trip() {
        for s in ALL {
            assert_eq!(TransactionStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn test_flag_reason_json() {
        let reason = FlagReason::AmountMismatch {
            expected: Money::from_cents(200_000),
            reported: Money::from_cents(150_000),
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["kind"], "amount_mismatch");
        assert_eq!(json["reported"], 1500.0);
    }

    #[test]
    fn test_reference_prefers_receipt() {
        let mut t = tx(PaymentChannel::MpesaStk);
        t.tracking_id = Some("ws_CO_1".into());
        assert_eq!(t.reference(), "ws_CO_1");
        t.receipt_number = Some("QK12ABC".into());
        assert_eq!(t.reference(), "QK12ABC");
    }
}
