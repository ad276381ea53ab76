//! Contribution obligation database models

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database model for the contribution_obligations table
#[derive(Debug, Clone, FromRow)]
pub struct ObligationModel {
    pub id: i64,
    pub member_id: i64,
    pub obligation_type: String,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub status: String,
    pub description: Option<String>,
    pub event_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate row for dashboard totals
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ObligationTotalsModel {
    pub pending_count: i64,
    pub paid_count: i64,
    pub missed_count: i64,
    pub expected_cents: i64,
    pub collected_cents: i64,
    pub outstanding_cents: i64,
}
