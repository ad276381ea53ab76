//! Reconciliation planning: what a gateway result should do to a transaction

use crate::entities::{ContributionObligation, FlagReason, PaymentTransaction, TransactionStatus};

use super::{GatewayOutcome, GatewayResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilePlan {
    /// Transaction already left `pending`; nothing to do
    AlreadyProcessed,
    /// Complete the transaction and credit the obligation
    Complete { receipt: Option<String> },
    /// Route to manual review instead of completing
    Flag(FlagReason),
    /// Close the transaction without crediting (`failed` or `timeout`)
    Fail(TransactionStatus),
}

impl ReconcilePlan {
    pub fn target_status(&self) -> Option<TransactionStatus> {
        match self {
            Self::AlreadyProcessed => None,
            Self::Complete { .. } => Some(TransactionStatus::Completed),
            Self::Flag(_) => Some(TransactionStatus::AwaitingApproval),
            Self::Fail(status) => Some(*status),
        }
    }
}

/// A gateway may only move a `pending` transaction; any later delivery is a repeat
#[inline]
pub fn is_duplicate_delivery(tx: &PaymentTransaction) -> bool {
    tx.status != TransactionStatus::Pending
}

/// Decide how `result` applies to `tx`.
///
/// A success whose reported amount differs from what is owed (or is missing) is flagged, never
/// completed.
pub fn plan_reconciliation(
    tx: &PaymentTransaction,
    obligation: Option<&ContributionObligation>,
    result: &GatewayResult,
) -> ReconcilePlan {
    if is_duplicate_delivery(tx) {
        return ReconcilePlan::AlreadyProcessed;
    }

    match result.outcome {
        GatewayOutcome::Success => {
            let expected = obligation.map_or(tx.amount, |o| o.amount);
            match result.amount {
                Some(reported) if reported == expected => ReconcilePlan::Complete {
                    receipt: result.receipt.clone(),
                },
                Some(reported) => ReconcilePlan::Flag(FlagReason::AmountMismatch { expected, reported }),
                None => ReconcilePlan::Flag(FlagReason::AmountUnreported { expected }),
            }
        }
        GatewayOutcome::Failed | GatewayOutcome::Cancelled => {
            ReconcilePlan::Fail(TransactionStatus::Failed)
        }
        GatewayOutcome::Timeout => ReconcilePlan::Fail(TransactionStatus::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ObligationType, PaymentChannel, TransitionCause};
    use crate::value_objects::{Money, Snowflake};
    use chrono::NaiveDate;

    fn obligation(amount: i64) -> ContributionObligation {
        ContributionObligation::new(
            Snowflake::new(10),
            Snowflake::new(20),
            ObligationType::Regular,
            Money::from_cents(amount),
            NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            None,
        )
        .unwrap()
    }

    fn pending_tx(amount: i64) -> PaymentTransaction {
        let mut tx = PaymentTransaction::initiate(
            Snowflake::new(1),
            Snowflake::new(10),
            Snowflake::new(20),
            PaymentChannel::MpesaStk,
            Money::from_cents(amount),
        );
        tx.tracking_id = Some("X1".into());
        tx
    }

    fn success(amount: i64) -> GatewayResult {
        GatewayResult::new(PaymentChannel::MpesaStk, "X1", GatewayOutcome::Success)
            .with_amount(Money::from_cents(amount))
            .with_receipt("QK12ABC")
    }

    #[test]
    fn test_matching_success_completes() {
        let plan = plan_reconciliation(&pending_tx(100_000), Some(&obligation(100_000)), &success(100_000));
        assert_eq!(
            plan,
            ReconcilePlan::Complete {
                receipt: Some("QK12ABC".into())
            }
        );
    }

    #[test]
    fn test_amount_mismatch_is_flagged() {
        let plan = plan_reconciliation(&pending_tx(200_000), Some(&obligation(200_000)), &success(150_000));
        assert_eq!(
            plan,
            ReconcilePlan::Flag(FlagReason::AmountMismatch {
                expected: Money::from_cents(200_000),
                reported: Money::from_cents(150_000),
            })
        );
        assert_eq!(plan.target_status(), Some(TransactionStatus::AwaitingApproval));
    }

    #[test]
    fn test_missing_amount_is_flagged() {
        let mut result = success(0);
        result.amount = None;
        let plan = plan_reconciliation(&pending_tx(100_000), Some(&obligation(100_000)), &result);
        assert!(matches!(plan, ReconcilePlan::Flag(FlagReason::AmountUnreported { .. })));
    }

    #[test]
    fn test_failures_map_to_terminal_states() {
        let tx = pending_tx(100_000);
        let ob = obligation(100_000);
        let mk = |o| GatewayResult::new(PaymentChannel::MpesaStk, "X1", o);
        assert_eq!(
            plan_reconciliation(&tx, Some(&ob), &mk(GatewayOutcome::Failed)),
            ReconcilePlan::Fail(TransactionStatus::Failed)
        );
        assert_eq!(
            plan_reconciliation(&tx, Some(&ob), &mk(GatewayOutcome::Cancelled)),
            ReconcilePlan::Fail(TransactionStatus::Failed)
        );
        assert_eq!(
            plan_reconciliation(&tx, Some(&ob), &mk(GatewayOutcome::Timeout)),
            ReconcilePlan::Fail(TransactionStatus::Timeout)
        );
    }

    #[test]
    fn test_processed_transactions_are_duplicates() {
        let mut tx = pending_tx(100_000);
        tx.transition(TransactionStatus::Completed, TransitionCause::Gateway)
            .unwrap();
        assert!(is_duplicate_delivery(&tx));
        assert_eq!(
            plan_reconciliation(&tx, Some(&obligation(100_000)), &success(100_000)),
            ReconcilePlan::AlreadyProcessed
        );

        let mut flagged = pending_tx(100_000);
        flagged
            .transition(TransactionStatus::AwaitingApproval, TransitionCause::Gateway)
            .unwrap();
        assert_eq!(
            plan_reconciliation(&flagged, None, &success(100_000)),
            ReconcilePlan::AlreadyProcessed
        );
    }

    #[test]
    fn test_planned_targets_are_legal_gateway_moves() {
        let tx = pending_tx(100_000);
        let ob = obligation(100_000);
        for result in [
            success(100_000),
            success(1),
            GatewayResult::new(PaymentChannel::MpesaStk, "X1", GatewayOutcome::Timeout),
        ] {
            let target = plan_reconciliation(&tx, Some(&ob), &result)
                .target_status()
                .unwrap();
            assert!(tx.status.can_transition_to(target, TransitionCause::Gateway));
        }
    }
}
