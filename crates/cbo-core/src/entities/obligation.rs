//! Contribution obligation entity - an amount a member owes by a due date

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::value_objects::{Money, Snowflake};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationType {
    /// Recurring dues
    Regular,
    /// Raised by an event such as a welfare case
    EventLinked,
    Penalty,
}

impl ObligationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::EventLinked => "event_linked",
            Self::Penalty => "penalty",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "regular" => Some(Self::Regular),
            "event_linked" => Some(Self::EventLinked),
            "penalty" => Some(Self::Penalty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    Pending,
    Paid,
    Missed,
}

impl ObligationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Missed => "missed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "missed" => Some(Self::Missed),
            _ => None,
        }
    }
}

impl fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionObligation {
    pub id: Snowflake,
    pub member_id: Snowflake,
    pub obligation_type: ObligationType,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub status: ObligationStatus,
    pub description: Option<String>,
    /// Identifier of the event that raised the liability (welfare case, meeting)
    pub event_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub created_by: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContributionObligation {
    pub fn new(
        id: Snowflake,
        member_id: Snowflake,
        obligation_type: ObligationType,
        amount: Money,
        due_date: NaiveDate,
        created_by: Option<Snowflake>,
    ) -> Result<Self, DomainError> {
        if !amount.is_positive() {
            return Err(DomainError::InvalidAmount);
        }
        let now = Utc::now();
        Ok(Self {
            id,
            member_id,
            obligation_type,
            amount,
            due_date,
            status: ObligationStatus::Pending,
            description: None,
            event_ref: None,
            paid_at: None,
            payment_reference: None,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_event_ref(mut self, event_ref: Option<String>) -> Self {
        self.event_ref = event_ref;
        self
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == ObligationStatus::Pending
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == ObligationStatus::Paid
    }

    /// Pending or missed; a missed obligation can still be paid late
    #[inline]
    pub fn is_payable(&self) -> bool {
        !self.is_paid()
    }

    /// Still pending after its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.due_date < today
    }

    /// Credit the obligation; an overdue (missed) obligation can still be settled late
    pub fn mark_paid(&mut self, reference: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            ObligationStatus::Paid => Err(DomainError::ObligationAlreadyPaid),
            ObligationStatus::Pending | ObligationStatus::Missed => {
                self.status = ObligationStatus::Paid;
                self.paid_at = Some(at);
                self.payment_reference = Some(reference.to_string());
                self.updated_at = at;
                Ok(())
            }
        }
    }

    /// Returns whether the obligation changed
    pub fn mark_missed(&mut self, today: NaiveDate) -> bool {
        if !self.is_overdue(today) {
            return false;
        }
        self.status = ObligationStatus::Missed;
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obligation(amount: i64) -> ContributionObligation {
        ContributionObligation::new(
            Snowflake::new(1),
            Snowflake::new(2),
            ObligationType::Regular,
            Money::from_cents(amount),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let result = ContributionObligation::new(
            Snowflake::new(1),
            Snowflake::new(2),
            ObligationType::Penalty,
            Money::ZERO,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            None,
        );
        assert!(matches!(result, Err(DomainError::InvalidAmount)));
    }

    #[test]
    fn test_mark_paid_once() {
        let mut ob = obligation(100_000);
        let at = Utc::now();
        ob.mark_paid("QK12ABC", at).unwrap();
        assert!(ob.is_paid());
        assert_eq!(ob.paid_at, Some(at));

        let err = ob.mark_paid("OTHER", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::ObligationAlreadyPaid));
        assert_eq!(ob.payment_reference.as_deref(), Some("QK12ABC"));
        assert_eq!(ob.paid_at, Some(at));
    }

    #[test]
    fn test_sweep_only_moves_overdue_pending() {
        let mut ob = obligation(100_000);
        assert!(!ob.mark_missed(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()));
        assert!(ob.mark_missed(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));
        assert_eq!(ob.status, ObligationStatus::Missed);
        assert!(!ob.mark_missed(NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()));
    }

    #[test]
    fn test_missed_can_still_be_paid() {
        let mut ob = obligation(100_000);
        ob.mark_missed(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert!(ob.is_payable());
        ob.mark_paid("LATE1", Utc::now()).unwrap();
        assert!(!ob.is_payable());
        assert!(ob.is_paid());
    }
}
