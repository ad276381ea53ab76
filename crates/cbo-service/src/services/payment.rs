//! Payment service
//!
//! Starts payments against obligations and resolves manually verified ones. Gateway results
//! are applied by [`super::reconciliation::ReconciliationService`], never here.

use cbo_core::{
    AuditAction, AuditLogEntry, ChargeRequest, DomainError, PaymentChannel, PaymentDecision,
    PaymentTransaction, Permissions, PhoneNumber, Settlement, Snowflake, TransactionChange,
    TransactionStatus, TransitionCause,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::dto::{
    InitiatePaymentRequest, InitiatePaymentResponse, PaymentDecisionRequest, TransactionResponse,
};

use super::context::ServiceContext;
use super::dashboard::DashboardService;
use super::error::{ServiceError, ServiceResult};
use super::session::SessionContext;

/// Upper bound for the approval queue
const APPROVAL_QUEUE_LIMIT: i64 = 200;

/// Payment service
pub struct PaymentService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PaymentService<'a> {
    /// Create a new PaymentService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Start paying an obligation.
    ///
    /// Every call creates a new transaction. A gateway failure leaves that transaction
    /// `pending` with the error recorded and is returned as a retryable error.
    #[instrument(skip(self, session, request), fields(actor_id = %session.user_id()))]
    pub async fn initiate(
        &self,
        session: &SessionContext,
        obligation_id: Snowflake,
        request: InitiatePaymentRequest,
    ) -> ServiceResult<InitiatePaymentResponse> {
        let channel = PaymentChannel::parse(&request.channel).ok_or_else(|| {
            ServiceError::validation(format!("Unknown payment channel: {}", request.channel))
        })?;

        let obligation = self
            .ctx
            .obligation_repo()
            .find_by_id(obligation_id)
            .await?
            .ok_or(DomainError::ObligationNotFound(obligation_id))?;

        if obligation.member_id != session.user_id() && !session.has(Permissions::MANAGE_PAYMENTS)
        {
            return Err(DomainError::NotObligationOwner.into());
        }
        if !obligation.is_payable() {
            return Err(DomainError::ObligationNotPayable(obligation.status.to_string()).into());
        }

        let mut tx = PaymentTransaction::initiate(
            self.ctx.generate_id(),
            obligation.id,
            session.user_id(),
            channel,
            obligation.amount,
        );

        if !channel.is_api_integrated() {
            let receipt = request
                .receipt_number
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    ServiceError::validation("A receipt number is required for manual payments")
                })?;
            tx.receipt_number = Some(receipt.to_string());
            tx.tracking_id = Some(format!("{}:{receipt}", channel.as_str()));
            tx.proof_url = request.proof_url;
            return self.submit_manual(session, tx).await;
        }

        // Validate everything before talking to the gateway
        let gateway = self.ctx.gateway(channel)?;
        let profile = self
            .ctx
            .profile_repo()
            .find_by_user_id(obligation.member_id)
            .await?;

        let phone = match request.phone.as_deref() {
            Some(raw) => Some(PhoneNumber::normalize(
                raw,
                &self.ctx.portal().default_country_code,
            ).map_err(DomainError::from)?),
            None => profile.as_ref().and_then(|p| p.phone.clone()),
        };
        if channel == PaymentChannel::MpesaStk && phone.is_none() {
            return Err(ServiceError::validation("A phone number is required for M-Pesa"));
        }
        // STK push charges whole shillings
        if channel == PaymentChannel::MpesaStk && !obligation.amount.is_whole_units() {
            return Err(ServiceError::validation(format!(
                "M-Pesa cannot charge {}; pay fractional amounts through another channel",
                obligation.amount
            )));
        }
        let email = request
            .email
            .or_else(|| session.email().map(str::to_string))
            .or_else(|| profile.as_ref().map(|p| p.email.clone()));
        if channel == PaymentChannel::Pesapal && email.is_none() {
            return Err(ServiceError::validation("An email address is required for Pesapal"));
        }
        tx.phone = phone.clone();

        let charge = ChargeRequest {
            transaction_id: tx.id,
            obligation_id: obligation.id,
            amount: obligation.amount,
            phone,
            email,
            payer_name: profile.as_ref().map(|p| p.display_name().to_string()),
            description: obligation
                .description
                .clone()
                .unwrap_or_else(|| format!("{} contribution", obligation.obligation_type.as_str())),
        };

        self.ctx.payment_repo().create(&tx, None).await?;

        match gateway.start_charge(&charge).await {
            Ok(started) => {
                self.ctx
                    .payment_repo()
                    .record_tracking_id(tx.id, &started.tracking_id)
                    .await?;
                tx.tracking_id = Some(started.tracking_id);

                info!(
                    transaction_id = %tx.id,
                    channel = %channel,
                    tracking_id = tx.tracking_id.as_deref().unwrap_or_default(),
                    "Payment initiated"
                );

                Ok(InitiatePaymentResponse {
                    transaction: TransactionResponse::from(&tx),
                    redirect_url: started.redirect_url,
                    message: started
                        .message
                        .unwrap_or_else(|| "Payment request sent".to_string()),
                })
            }
            Err(e) => {
                warn!(transaction_id = %tx.id, channel = %channel, error = %e, "Gateway rejected charge");
                if let Err(record_err) = self
                    .ctx
                    .payment_repo()
                    .record_initiation_error(tx.id, &e.to_string())
                    .await
                {
                    error!(transaction_id = %tx.id, error = %record_err, "Failed to record gateway error");
                }
                Err(ServiceError::external(e.to_string()))
            }
        }
    }

    async fn submit_manual(
        &self,
        session: &SessionContext,
        tx: PaymentTransaction,
    ) -> ServiceResult<InitiatePaymentResponse> {
        let audit = AuditLogEntry::new(
            self.ctx.generate_id(),
            AuditAction::PaymentSubmitted,
            format!("Submitted {} payment of {} for approval", tx.channel, tx.amount),
        )
        .actor(session.user_id())
        .target("payment_transaction", tx.id)
        .metadata(json!({
            "obligation_id": tx.obligation_id.map(|id| id.to_string()),
            "channel": tx.channel.as_str(),
            "amount": tx.amount,
            "receipt_number": tx.receipt_number,
        }));

        self.ctx.payment_repo().create(&tx, Some(&audit)).await?;
        DashboardService::new(self.ctx)
            .invalidate_for(session.user_id())
            .await;

        info!(transaction_id = %tx.id, channel = %tx.channel, "Manual payment submitted");

        Ok(InitiatePaymentResponse {
            transaction: TransactionResponse::from(&tx),
            redirect_url: None,
            message: "Payment submitted for approval".to_string(),
        })
    }

    /// Approve or reject a transaction awaiting approval
    #[instrument(skip(self, session, request), fields(actor_id = %session.user_id()))]
    pub async fn decide(
        &self,
        session: &SessionContext,
        transaction_id: Snowflake,
        request: PaymentDecisionRequest,
    ) -> ServiceResult<TransactionResponse> {
        session.require(Permissions::APPROVE_PAYMENTS)?;

        let tx = self.find(transaction_id).await?;
        if tx.status != TransactionStatus::AwaitingApproval {
            return Err(DomainError::NotAwaitingApproval.into());
        }
        let target = request.decision.target_status();
        tx.clone().transition(target, TransitionCause::Decision)?;

        let actor = session.user_id();
        let now = Utc::now();
        let notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let metadata = json!({
            "decision": request.decision,
            "notes": notes,
            "obligation_id": tx.obligation_id.map(|id| id.to_string()),
            "amount": tx.amount,
            "flag_reason": tx.flag_reason,
        });

        let applied = match request.decision {
            PaymentDecision::Approved => {
                let settlement = Settlement {
                    transaction_id: tx.id,
                    from: TransactionStatus::AwaitingApproval,
                    obligation_id: tx.obligation_id,
                    reference: tx.reference(),
                    receipt_number: tx.receipt_number.clone(),
                    reported_amount: None,
                    decided_by: Some(actor),
                    decision_notes: notes.clone(),
                    at: now,
                };
                let audit = AuditLogEntry::new(
                    self.ctx.generate_id(),
                    AuditAction::PaymentApproved,
                    format!("Approved {} payment of {}", tx.channel, tx.amount),
                )
                .actor(actor)
                .target("payment_transaction", tx.id)
                .metadata(metadata);

                let result = self.ctx.payment_repo().settle(&settlement, &audit).await?;
                if result.applied && !result.obligation_credited && tx.obligation_id.is_some() {
                    warn!(transaction_id = %tx.id, "Approved payment found its obligation already paid");
                }
                result.applied
            }
            PaymentDecision::Rejected => {
                let change = TransactionChange {
                    transaction_id: tx.id,
                    from: TransactionStatus::AwaitingApproval,
                    to: TransactionStatus::Rejected,
                    flag_reason: None,
                    reported_amount: None,
                    receipt_number: None,
                    decided_by: Some(actor),
                    decision_notes: notes.clone(),
                    at: now,
                };
                let audit = AuditLogEntry::new(
                    self.ctx.generate_id(),
                    AuditAction::PaymentRejected,
                    format!("Rejected {} payment of {}", tx.channel, tx.amount),
                )
                .actor(actor)
                .target("payment_transaction", tx.id)
                .metadata(metadata);

                self.ctx.payment_repo().apply_change(&change, &audit).await?
            }
        };

        if !applied {
            // Someone else decided first
            return Err(DomainError::NotAwaitingApproval.into());
        }

        if let Some(member_id) = self.member_of(&tx).await? {
            DashboardService::new(self.ctx).invalidate_for(member_id).await;
        }

        info!(transaction_id = %tx.id, decision = ?request.decision, "Payment decided");

        let updated = self.find(transaction_id).await?;
        Ok(TransactionResponse::from(updated))
    }

    /// Transactions waiting for a treasurer, oldest first
    #[instrument(skip(self, session))]
    pub async fn list_awaiting_approval(
        &self,
        session: &SessionContext,
    ) -> ServiceResult<Vec<TransactionResponse>> {
        session.require(Permissions::APPROVE_PAYMENTS)?;
        let transactions = self
            .ctx
            .payment_repo()
            .find_awaiting_approval(APPROVAL_QUEUE_LIMIT)
            .await?;
        Ok(transactions.iter().map(TransactionResponse::from).collect())
    }

    /// One transaction, for its payer or a payments manager
    #[instrument(skip(self, session))]
    pub async fn get(
        &self,
        session: &SessionContext,
        transaction_id: Snowflake,
    ) -> ServiceResult<TransactionResponse> {
        let tx = self.find(transaction_id).await?;
        if tx.payer_id != Some(session.user_id()) {
            session.require(Permissions::MANAGE_PAYMENTS)?;
        }
        Ok(TransactionResponse::from(tx))
    }

    async fn find(&self, transaction_id: Snowflake) -> ServiceResult<PaymentTransaction> {
        self.ctx
            .payment_repo()
            .find_by_id(transaction_id)
            .await?
            .ok_or_else(|| DomainError::TransactionNotFound(transaction_id.to_string()).into())
    }

    /// Member whose statistics a change to `tx` affects
    async fn member_of(&self, tx: &PaymentTransaction) -> ServiceResult<Option<Snowflake>> {
        match tx.obligation_id {
            Some(obligation_id) => Ok(self
                .ctx
                .obligation_repo()
                .find_by_id(obligation_id)
                .await?
                .map(|o| o.member_id)
                .or(tx.payer_id)),
            None => Ok(tx.payer_id),
        }
    }
}
