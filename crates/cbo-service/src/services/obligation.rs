//! Obligation service
//!
//! Creates contribution obligations and sweeps overdue ones to `missed`. Obligations are
//! never deleted, and `paid` is only reached through payment settlement.

use cbo_core::{
    AuditAction, AuditLogEntry, ContributionObligation, DomainError, Money, ObligationType,
    Permissions, Snowflake,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use tracing::{info, instrument};

use crate::dto::{
    BulkObligationRequest, BulkObligationResponse, CreateObligationRequest, ObligationResponse,
    SweepResponse,
};

use super::context::ServiceContext;
use super::dashboard::DashboardService;
use super::error::{ServiceError, ServiceResult};
use super::session::SessionContext;

/// Obligation service
pub struct ObligationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ObligationService<'a> {
    /// Create a new ObligationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create an obligation for one member
    #[instrument(skip(self, session, request), fields(actor_id = %session.user_id()))]
    pub async fn create_obligation(
        &self,
        session: &SessionContext,
        request: CreateObligationRequest,
    ) -> ServiceResult<ObligationResponse> {
        session.require(Permissions::MANAGE_CONTRIBUTIONS)?;

        let member_id: Snowflake = request
            .member_id
            .parse()
            .map_err(|_| ServiceError::validation("Invalid member_id format"))?;
        let obligation_type = parse_obligation_type(&request.obligation_type)?;
        let amount = parse_amount(request.amount)?;

        let obligation = ContributionObligation::new(
            self.ctx.generate_id(),
            member_id,
            obligation_type,
            amount,
            request.due_date,
            Some(session.user_id()),
        )?
        .with_description(request.description)
        .with_event_ref(request.event_ref);

        let audit = AuditLogEntry::new(
            self.ctx.generate_id(),
            AuditAction::ObligationCreated,
            format!("Created {} obligation of {amount}", obligation_type.as_str()),
        )
        .actor(session.user_id())
        .target("contribution_obligation", obligation.id)
        .metadata(json!({
            "member_id": member_id.to_string(),
            "amount": amount,
            "due_date": obligation.due_date,
            "event_ref": obligation.event_ref,
        }));

        self.ctx
            .obligation_repo()
            .create_many(std::slice::from_ref(&obligation), &audit)
            .await?;
        DashboardService::new(self.ctx).invalidate_for(member_id).await;

        info!(obligation_id = %obligation.id, member_id = %member_id, "Obligation created");

        Ok(ObligationResponse::from(obligation))
    }

    /// Create the same obligation for every member, e.g. a welfare contribution
    #[instrument(skip(self, session, request), fields(actor_id = %session.user_id()))]
    pub async fn create_for_all_members(
        &self,
        session: &SessionContext,
        request: BulkObligationRequest,
    ) -> ServiceResult<BulkObligationResponse> {
        session.require(Permissions::MANAGE_CONTRIBUTIONS)?;

        let obligation_type = parse_obligation_type(&request.obligation_type)?;
        let amount = parse_amount(request.amount)?;

        let member_ids = self.ctx.profile_repo().list_member_ids().await?;
        if member_ids.is_empty() {
            return Ok(BulkObligationResponse { created: 0 });
        }

        let obligations = member_ids
            .iter()
            .map(|&member_id| {
                ContributionObligation::new(
                    self.ctx.generate_id(),
                    member_id,
                    obligation_type,
                    amount,
                    request.due_date,
                    Some(session.user_id()),
                )
                .map(|o| {
                    o.with_description(request.description.clone())
                        .with_event_ref(request.event_ref.clone())
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let audit = AuditLogEntry::new(
            self.ctx.generate_id(),
            AuditAction::ObligationsBulkCreated,
            format!(
                "Created {} {} obligations of {amount}",
                obligations.len(),
                obligation_type.as_str()
            ),
        )
        .actor(session.user_id())
        .metadata(json!({
            "count": obligations.len(),
            "amount": amount,
            "due_date": request.due_date,
            "event_ref": request.event_ref,
        }));

        self.ctx
            .obligation_repo()
            .create_many(&obligations, &audit)
            .await?;
        DashboardService::new(self.ctx)
            .invalidate_for_members(member_ids)
            .await;

        info!(count = obligations.len(), "Obligations created for all members");

        Ok(BulkObligationResponse {
            created: obligations.len(),
        })
    }

    /// Obligations of one member, newest due date first
    #[instrument(skip(self, session))]
    pub async fn list_for_member(
        &self,
        session: &SessionContext,
        member_id: Snowflake,
    ) -> ServiceResult<Vec<ObligationResponse>> {
        session.require_self_or(member_id, Permissions::VIEW_FINANCIAL_REPORTS)?;

        let obligations = self.ctx.obligation_repo().find_by_member(member_id).await?;
        Ok(obligations.iter().map(ObligationResponse::from).collect())
    }

    /// Sweep requested by a member holding MANAGE_CONTRIBUTIONS
    #[instrument(skip(self, session), fields(actor_id = %session.user_id()))]
    pub async fn sweep_requested(&self, session: &SessionContext) -> ServiceResult<SweepResponse> {
        session.require(Permissions::MANAGE_CONTRIBUTIONS)?;
        let missed = self.sweep_overdue(Utc::now()).await?;
        Ok(SweepResponse { missed })
    }

    /// Move `pending` obligations due before `now`'s date to `missed`
    #[instrument(skip(self))]
    pub async fn sweep_overdue(&self, now: DateTime<Utc>) -> ServiceResult<usize> {
        let today: NaiveDate = now.date_naive();
        let changed = self.ctx.obligation_repo().mark_overdue_missed(today).await?;
        if changed.is_empty() {
            return Ok(0);
        }

        let audit = AuditLogEntry::new(
            self.ctx.generate_id(),
            AuditAction::ObligationsSwept,
            format!("Marked {} overdue obligations as missed", changed.len()),
        )
        .metadata(json!({
            "count": changed.len(),
            "as_of": today,
            "obligation_ids": changed.iter().map(|(id, _)| id.to_string()).collect::<Vec<_>>(),
        }));
        self.ctx.audit_repo().append(&audit).await?;

        DashboardService::new(self.ctx)
            .invalidate_for_members(changed.iter().map(|(_, member_id)| *member_id))
            .await;

        info!(count = changed.len(), as_of = %today, "Overdue obligations swept");

        Ok(changed.len())
    }
}

fn parse_obligation_type(raw: &str) -> ServiceResult<ObligationType> {
    ObligationType::parse(raw)
        .ok_or_else(|| ServiceError::validation(format!("Unknown obligation type: {raw}")))
}

fn parse_amount(amount: f64) -> ServiceResult<Money> {
    match Money::from_major(amount) {
        Some(money) if money.is_positive() => Ok(money),
        _ => Err(DomainError::InvalidAmount.into()),
    }
}
