//! Contribution obligation entity <-> model mapper

use chrono::NaiveDate;

use cbo_core::entities::{ContributionObligation, ObligationStatus, ObligationType};
use cbo_core::error::DomainError;
use cbo_core::traits::ObligationTotals;
use cbo_core::value_objects::{Money, Snowflake};

use super::corrupt_column;
use crate::models::{ObligationModel, ObligationTotalsModel};

impl TryFrom<ObligationModel> for ContributionObligation {
    type Error = DomainError;

    fn try_from(model: ObligationModel) -> Result<Self, Self::Error> {
        let obligation_type = ObligationType::parse(&model.obligation_type).ok_or_else(|| {
            corrupt_column("contribution_obligations.obligation_type", &model.obligation_type)
        })?;
        let status = ObligationStatus::parse(&model.status)
            .ok_or_else(|| corrupt_column("contribution_obligations.status", &model.status))?;

        Ok(ContributionObligation {
            id: Snowflake::new(model.id),
            member_id: Snowflake::new(model.member_id),
            obligation_type,
            amount: Money::from_cents(model.amount_cents),
            due_date: model.due_date,
            status,
            description: model.description,
            event_ref: model.event_ref,
            paid_at: model.paid_at,
            payment_reference: model.payment_reference,
            created_by: model.created_by.map(Snowflake::new),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<ObligationTotalsModel> for ObligationTotals {
    fn from(model: ObligationTotalsModel) -> Self {
        ObligationTotals {
            pending_count: model.pending_count,
            paid_count: model.paid_count,
            missed_count: model.missed_count,
            expected: Money::from_cents(model.expected_cents),
            collected: Money::from_cents(model.collected_cents),
            outstanding: Money::from_cents(model.outstanding_cents),
        }
    }
}

/// Obligation values prepared for insertion
pub struct ObligationInsert<'a> {
    pub id: i64,
    pub member_id: i64,
    pub obligation_type: &'static str,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub status: &'static str,
    pub description: Option<&'a str>,
    pub event_ref: Option<&'a str>,
    pub created_by: Option<i64>,
}

impl<'a> ObligationInsert<'a> {
    pub fn new(obligation: &'a ContributionObligation) -> Self {
        Self {
            id: obligation.id.into_inner(),
            member_id: obligation.member_id.into_inner(),
            obligation_type: obligation.obligation_type.as_str(),
            amount_cents: obligation.amount.cents(),
            due_date: obligation.due_date,
            status: obligation.status.as_str(),
            description: obligation.description.as_deref(),
            event_ref: obligation.event_ref.as_deref(),
            created_by: obligation.created_by.map(Snowflake::into_inner),
        }
    }
}
