//! Reconciliation service
//!
//! Applies a verified gateway result to the transaction it names. Every store write is a
//! conditional update on `pending`, so a redelivered or concurrent callback changes nothing
//! and leaves no second audit entry.

use cbo_core::{
    plan_reconciliation, AuditAction, AuditLogEntry, DomainError, GatewayOutcome, GatewayResult,
    PaymentTransaction, PhoneNumber, ReconcilePlan, Settlement, Snowflake, TransactionChange,
    TransactionStatus,
};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::context::ServiceContext;
use super::dashboard::DashboardService;
use super::error::ServiceResult;

/// What a gateway result did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Transaction completed and its obligation credited
    Credited {
        transaction_id: Snowflake,
        obligation_credited: bool,
    },
    /// Routed to manual review
    Flagged { transaction_id: Snowflake },
    /// Closed as failed or timed out
    Failed {
        transaction_id: Snowflake,
        status: TransactionStatus,
    },
    /// Already processed; nothing changed
    Duplicate { transaction_id: Snowflake },
    /// No transaction carried the tracking id
    Unmatched { transaction_id: Option<Snowflake> },
}

/// Reconciliation service
pub struct ReconciliationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReconciliationService<'a> {
    /// Create a new ReconciliationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Apply `result`, which the caller has already authenticated
    #[instrument(skip(self, result), fields(channel = %result.channel, tracking_id = %result.tracking_id))]
    pub async fn reconcile(&self, result: &GatewayResult) -> ServiceResult<ReconcileOutcome> {
        let Some(tx) = self
            .ctx
            .payment_repo()
            .find_by_tracking_id(&result.tracking_id)
            .await?
        else {
            return self.record_unmatched(result).await;
        };

        let obligation = match tx.obligation_id {
            Some(id) => self.ctx.obligation_repo().find_by_id(id).await?,
            None => None,
        };

        let plan = plan_reconciliation(&tx, obligation.as_ref(), result);
        let member_id = obligation.as_ref().map(|o| o.member_id).or(tx.payer_id);
        let now = Utc::now();

        let outcome = match plan {
            ReconcilePlan::AlreadyProcessed => {
                info!(transaction_id = %tx.id, status = %tx.status, "Duplicate gateway delivery ignored");
                return Ok(ReconcileOutcome::Duplicate {
                    transaction_id: tx.id,
                });
            }
            ReconcilePlan::Complete { receipt } => {
                let receipt_number = receipt.or_else(|| tx.receipt_number.clone());
                let settlement = Settlement {
                    transaction_id: tx.id,
                    from: TransactionStatus::Pending,
                    obligation_id: tx.obligation_id,
                    reference: receipt_number.clone().unwrap_or_else(|| tx.reference()),
                    receipt_number: receipt_number.clone(),
                    reported_amount: result.amount,
                    decided_by: None,
                    decision_notes: None,
                    at: now,
                };
                let audit = self
                    .audit(&tx, AuditAction::PaymentReconciled, result)
                    .metadata(json!({
                        "obligation_id": tx.obligation_id.map(|id| id.to_string()),
                        "amount": result.amount,
                        "receipt_number": receipt_number,
                        "tracking_id": result.tracking_id,
                    }));

                let settled = self.ctx.payment_repo().settle(&settlement, &audit).await?;
                if !settled.applied {
                    return Ok(self.raced(&tx));
                }
                if !settled.obligation_credited && tx.obligation_id.is_some() {
                    warn!(transaction_id = %tx.id, "Completed payment found its obligation already paid");
                }
                info!(transaction_id = %tx.id, "Payment reconciled");
                ReconcileOutcome::Credited {
                    transaction_id: tx.id,
                    obligation_credited: settled.obligation_credited,
                }
            }
            ReconcilePlan::Flag(reason) => {
                let change = TransactionChange {
                    transaction_id: tx.id,
                    from: TransactionStatus::Pending,
                    to: TransactionStatus::AwaitingApproval,
                    flag_reason: Some(reason.clone()),
                    reported_amount: result.amount,
                    receipt_number: result.receipt.clone(),
                    decided_by: None,
                    decision_notes: None,
                    at: now,
                };
                let audit = self
                    .audit(&tx, AuditAction::PaymentFlagged, result)
                    .metadata(json!({
                        "obligation_id": tx.obligation_id.map(|id| id.to_string()),
                        "flag_reason": reason,
                        "reported_amount": result.amount,
                        "tracking_id": result.tracking_id,
                    }));

                if !self.ctx.payment_repo().apply_change(&change, &audit).await? {
                    return Ok(self.raced(&tx));
                }
                warn!(transaction_id = %tx.id, reason = %reason.describe(), "Payment flagged for review");
                ReconcileOutcome::Flagged {
                    transaction_id: tx.id,
                }
            }
            ReconcilePlan::Fail(status) => {
                let change = TransactionChange {
                    transaction_id: tx.id,
                    from: TransactionStatus::Pending,
                    to: status,
                    flag_reason: None,
                    reported_amount: result.amount,
                    receipt_number: None,
                    decided_by: None,
                    decision_notes: None,
                    at: now,
                };
                let audit = self
                    .audit(&tx, AuditAction::PaymentFailed, result)
                    .metadata(json!({
                        "obligation_id": tx.obligation_id.map(|id| id.to_string()),
                        "status": status,
                        "gateway_description": result.description,
                        "tracking_id": result.tracking_id,
                    }));

                if !self.ctx.payment_repo().apply_change(&change, &audit).await? {
                    return Ok(self.raced(&tx));
                }
                info!(transaction_id = %tx.id, status = %status, "Payment closed without credit");
                ReconcileOutcome::Failed {
                    transaction_id: tx.id,
                    status,
                }
            }
        };

        if let Some(member_id) = member_id {
            DashboardService::new(self.ctx).invalidate_for(member_id).await;
        }

        Ok(outcome)
    }

    /// A success for a tracking id nobody initiated is kept for a treasurer to match by hand
    async fn record_unmatched(&self, result: &GatewayResult) -> ServiceResult<ReconcileOutcome> {
        if !result.outcome.is_success() {
            warn!(outcome = ?result.outcome, "Unmatched non-success callback dropped");
            return Ok(ReconcileOutcome::Unmatched {
                transaction_id: None,
            });
        }

        let amount = result.amount.unwrap_or_default();
        let mut tx = PaymentTransaction::unsolicited(
            self.ctx.generate_id(),
            result.channel,
            result.tracking_id.clone(),
            amount,
        );
        tx.receipt_number = result.receipt.clone();
        tx.phone = result.phone.as_deref().and_then(|raw| {
            PhoneNumber::normalize(raw, &self.ctx.portal().default_country_code).ok()
        });

        let audit = self
            .audit(&tx, AuditAction::PaymentFlagged, result)
            .metadata(json!({
                "flag_reason": tx.flag_reason,
                "reported_amount": result.amount,
                "receipt_number": result.receipt,
                "tracking_id": result.tracking_id,
            }));

        match self.ctx.payment_repo().create(&tx, Some(&audit)).await {
            Ok(()) => {}
            Err(DomainError::DuplicateTrackingId(_)) => {
                // A concurrent delivery recorded it first
                let stored = self
                    .ctx
                    .payment_repo()
                    .find_by_tracking_id(&result.tracking_id)
                    .await?
                    .ok_or_else(|| DomainError::DuplicateTrackingId(result.tracking_id.clone()))?;
                info!(transaction_id = %stored.id, "Duplicate unmatched callback ignored");
                return Ok(ReconcileOutcome::Duplicate {
                    transaction_id: stored.id,
                });
            }
            Err(e) => return Err(e.into()),
        }

        DashboardService::new(self.ctx)
            .invalidate_for_members(std::iter::empty())
            .await;

        warn!(transaction_id = %tx.id, amount = %amount, "Unmatched payment recorded for review");
        Ok(ReconcileOutcome::Unmatched {
            transaction_id: Some(tx.id),
        })
    }

    fn audit(
        &self,
        tx: &PaymentTransaction,
        action: AuditAction,
        result: &GatewayResult,
    ) -> AuditLogEntry {
        AuditLogEntry::new(
            self.ctx.generate_id(),
            action,
            format!("{} callback for {} payment", outcome_label(result.outcome), tx.channel),
        )
        .target("payment_transaction", tx.id)
    }

    fn raced(&self, tx: &PaymentTransaction) -> ReconcileOutcome {
        info!(transaction_id = %tx.id, "Concurrent delivery already applied");
        ReconcileOutcome::Duplicate {
            transaction_id: tx.id,
        }
    }
}

fn outcome_label(outcome: GatewayOutcome) -> &'static str {
    match outcome {
        GatewayOutcome::Success => "Success",
        GatewayOutcome::Failed => "Failure",
        GatewayOutcome::Timeout => "Timeout",
        GatewayOutcome::Cancelled => "Cancellation",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{InitiatePaymentRequest, PaymentDecisionRequest};
    use crate::services::PaymentService;
    use crate::testing::TestHarness;
    use cbo_core::{
        FlagReason, MemberRole, Money, ObligationStatus, PaymentChannel,
        PaymentDecision,
    };

    /// Start an STK payment and return (obligation id, transaction id, tracking id)
    async fn started_payment(h: &TestHarness, member: Snowflake) -> (Snowflake, Snowflake, String) {
        let obligation = h.seed_obligation(member, 100_000);
        let session = h.session(member, &[MemberRole::Member]);
        let started = PaymentService::new(&h.ctx)
            .initiate(
                &session,
                obligation.id,
                InitiatePaymentRequest {
                    channel: "mpesa_stk".into(),
                    phone: Some("0712345678".into()),
                    email: None,
                    receipt_number: None,
                    proof_url: None,
                },
            )
            .await
            .unwrap();
        let tx_id = started.transaction.id.parse().unwrap();
        (obligation.id, tx_id, started.transaction.tracking_id.unwrap())
    }

    fn success(tracking_id: &str, cents: i64) -> GatewayResult {
        GatewayResult::new(PaymentChannel::MpesaStk, tracking_id, GatewayOutcome::Success)
            .with_amount(Money::from_cents(cents))
            .with_receipt("RKT1A2B3C4")
    }

    #[tokio::test]
    async fn test_success_credits_once() {
        let h = TestHarness::new();
        let (obligation_id, tx_id, tracking_id) = started_payment(&h, Snowflake::new(700)).await;
        let service = ReconciliationService::new(&h.ctx);

        let first = service.reconcile(&success(&tracking_id, 100_000)).await.unwrap();
        assert_eq!(
            first,
            ReconcileOutcome::Credited {
                transaction_id: tx_id,
                obligation_credited: true
            }
        );

        let second = service.reconcile(&success(&tracking_id, 100_000)).await.unwrap();
        assert_eq!(second, ReconcileOutcome::Duplicate { transaction_id: tx_id });

        let obligation = h.store.obligation(obligation_id);
        assert_eq!(obligation.status, ObligationStatus::Paid);
        assert_eq!(obligation.payment_reference.as_deref(), Some("RKT1A2B3C4"));
        assert_eq!(h.store.transaction(tx_id).status, TransactionStatus::Completed);
        assert_eq!(h.store.count_audit(AuditAction::PaymentReconciled), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deliveries_credit_once() {
        let h = TestHarness::new();
        let (obligation_id, tx_id, tracking_id) = started_payment(&h, Snowflake::new(705)).await;
        let service = ReconciliationService::new(&h.ctx);
        let result = success(&tracking_id, 100_000);

        let (a, b, c) = tokio::join!(
            service.reconcile(&result),
            service.reconcile(&result),
            service.reconcile(&result),
        );
        let outcomes = [a.unwrap(), b.unwrap(), c.unwrap()];

        let credited = outcomes
            .iter()
            .filter(|o| {
                **o == ReconcileOutcome::Credited {
                    transaction_id: tx_id,
                    obligation_credited: true,
                }
            })
            .count();
        let duplicates = outcomes
            .iter()
            .filter(|o| **o == ReconcileOutcome::Duplicate { transaction_id: tx_id })
            .count();
        assert_eq!((credited, duplicates), (1, 2), "{outcomes:?}");
        assert_eq!(h.store.obligation(obligation_id).status, ObligationStatus::Paid);
        assert_eq!(h.store.count_audit(AuditAction::PaymentReconciled), 1);
    }

    #[tokio::test]
    async fn test_amount_mismatch_is_flagged_not_credited() {
        let h = TestHarness::new();
        let (obligation_id, tx_id, tracking_id) = started_payment(&h, Snowflake::new(701)).await;

        let outcome = ReconciliationService::new(&h.ctx)
            .reconcile(&success(&tracking_id, 50_000))
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Flagged { transaction_id: tx_id });

        let tx = h.store.transaction(tx_id);
        assert_eq!(tx.status, TransactionStatus::AwaitingApproval);
        assert_eq!(
            tx.flag_reason,
            Some(FlagReason::AmountMismatch {
                expected: Money::from_cents(100_000),
                reported: Money::from_cents(50_000),
            })
        );
        assert_eq!(tx.reported_amount, Some(Money::from_cents(50_000)));
        assert_eq!(h.store.obligation(obligation_id).status, ObligationStatus::Pending);
        assert_eq!(h.store.count_audit(AuditAction::PaymentFlagged), 1);
    }

    #[tokio::test]
    async fn test_flagged_payment_completes_through_decision() {
        let h = TestHarness::new();
        let (obligation_id, tx_id, tracking_id) = started_payment(&h, Snowflake::new(702)).await;
        let result = GatewayResult::new(PaymentChannel::MpesaStk, tracking_id, GatewayOutcome::Success);

        ReconciliationService::new(&h.ctx).reconcile(&result).await.unwrap();
        assert_eq!(h.store.obligation(obligation_id).status, ObligationStatus::Pending);

        let treasurer = h.session(Snowflake::new(2), &[MemberRole::Treasurer]);
        PaymentService::new(&h.ctx)
            .decide(
                &treasurer,
                tx_id,
                PaymentDecisionRequest {
                    decision: PaymentDecision::Approved,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(h.store.obligation(obligation_id).status, ObligationStatus::Paid);
    }

    #[tokio::test]
    async fn test_failure_closes_without_credit() {
        let h = TestHarness::new();
        let (obligation_id, tx_id, tracking_id) = started_payment(&h, Snowflake::new(703)).await;
        let cancelled =
            GatewayResult::new(PaymentChannel::MpesaStk, tracking_id.clone(), GatewayOutcome::Cancelled);

        let outcome = ReconciliationService::new(&h.ctx)
            .reconcile(&cancelled)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Failed {
                transaction_id: tx_id,
                status: TransactionStatus::Failed
            }
        );

        // a late success cannot revive it
        let late = ReconciliationService::new(&h.ctx)
            .reconcile(&success(&tracking_id, 100_000))
            .await
            .unwrap();
        assert_eq!(late, ReconcileOutcome::Duplicate { transaction_id: tx_id });
        assert_eq!(h.store.obligation(obligation_id).status, ObligationStatus::Pending);
        assert_eq!(h.store.count_audit(AuditAction::PaymentFailed), 1);
    }

    #[tokio::test]
    async fn test_unmatched_success_is_kept_for_review() {
        let h = TestHarness::new();
        let service = ReconciliationService::new(&h.ctx);

        let outcome = service.reconcile(&success("ws_CO_unknown", 30_000)).await.unwrap();
        let ReconcileOutcome::Unmatched {
            transaction_id: Some(tx_id),
        } = outcome
        else {
            panic!("expected an unsolicited transaction, got {outcome:?}");
        };

        let tx = h.store.transaction(tx_id);
        assert_eq!(tx.status, TransactionStatus::AwaitingApproval);
        assert_eq!(tx.flag_reason, Some(FlagReason::UnmatchedCallback));
        assert!(tx.obligation_id.is_none());

        let again = service.reconcile(&success("ws_CO_unknown", 30_000)).await.unwrap();
        assert!(matches!(again, ReconcileOutcome::Duplicate { .. }));
        assert_eq!(h.store.count_audit(AuditAction::PaymentFlagged), 1);
    }

    #[tokio::test]
    async fn test_losing_unmatched_insert_reports_stored_transaction() {
        let h = TestHarness::new();
        let service = ReconciliationService::new(&h.ctx);
        let result = success("ws_CO_raced", 30_000);

        let Ok(ReconcileOutcome::Unmatched {
            transaction_id: Some(stored_id),
        }) = service.record_unmatched(&result).await
        else {
            panic!("first delivery should be recorded");
        };

        // second writer saw no row before inserting
        let outcome = service.record_unmatched(&result).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Duplicate { transaction_id: stored_id });
        assert_eq!(h.store.count_audit(AuditAction::PaymentFlagged), 1);
    }

    #[tokio::test]
    async fn test_unmatched_failure_is_dropped() {
        let h = TestHarness::new();
        let result =
            GatewayResult::new(PaymentChannel::MpesaStk, "ws_CO_gone", GatewayOutcome::Failed);
        let outcome = ReconciliationService::new(&h.ctx)
            .reconcile(&result)
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Unmatched { transaction_id: None });
        assert!(h.store.audit_entries().is_empty());
    }
}
