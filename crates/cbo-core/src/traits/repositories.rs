//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Multi-row changes that must not be observed half done
//! (crediting, status changes with their audit entry) are single repository calls so the
//! implementation can run them in one store transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{
    AuditLogEntry, ContributionObligation, FlagReason, PaymentTransaction, Profile,
    RoleAssignment, TransactionStatus,
};
use crate::error::DomainError;
use crate::value_objects::{MemberRole, Money, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Profile Repository
// ============================================================================

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_user_id(&self, user_id: Snowflake) -> RepoResult<Option<Profile>>;

    /// Case-insensitive email lookup
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Profile>>;

    /// Insert or replace the profile for `profile.user_id`
    async fn upsert(&self, profile: &Profile) -> RepoResult<()>;

    async fn mark_phone_verified(&self, user_id: Snowflake, at: DateTime<Utc>) -> RepoResult<()>;

    /// Everyone with a profile or an active role assignment
    async fn list_member_ids(&self) -> RepoResult<Vec<Snowflake>>;
}

// ============================================================================
// Role Assignment Repository
// ============================================================================

#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    async fn find_active_by_user(&self, user_id: Snowflake) -> RepoResult<Vec<RoleAssignment>>;

    async fn find_active(
        &self,
        user_id: Snowflake,
        role: MemberRole,
    ) -> RepoResult<Option<RoleAssignment>>;

    /// Store a new assignment together with its audit entry
    async fn create(&self, assignment: &RoleAssignment, audit: &AuditLogEntry) -> RepoResult<()>;

    /// Stamp `superseded_at` on an active assignment; returns false if it was not active
    async fn supersede(
        &self,
        assignment_id: Snowflake,
        at: DateTime<Utc>,
        audit: &AuditLogEntry,
    ) -> RepoResult<bool>;
}

// ============================================================================
// Obligation Repository
// ============================================================================

/// Aggregates over obligations, for dashboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObligationTotals {
    pub pending_count: i64,
    pub paid_count: i64,
    pub missed_count: i64,
    pub expected: Money,
    pub collected: Money,
    pub outstanding: Money,
}

#[async_trait]
pub trait ObligationRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<ContributionObligation>>;

    /// Newest due date first
    async fn find_by_member(&self, member_id: Snowflake)
        -> RepoResult<Vec<ContributionObligation>>;

    /// Store obligations and the audit entry describing them in one unit
    async fn create_many(
        &self,
        obligations: &[ContributionObligation],
        audit: &AuditLogEntry,
    ) -> RepoResult<()>;

    /// Move `pending` obligations due before `today` to `missed`.
    ///
    /// Returns `(obligation_id, member_id)` for every row changed.
    async fn mark_overdue_missed(&self, today: NaiveDate)
        -> RepoResult<Vec<(Snowflake, Snowflake)>>;

    /// Totals for one member, or for everyone when `member_id` is None
    async fn totals(&self, member_id: Option<Snowflake>) -> RepoResult<ObligationTotals>;
}

// ============================================================================
// Payment Repository
// ============================================================================

/// Conditional status change of a transaction that does not credit anything
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionChange {
    pub transaction_id: Snowflake,
    /// Applied only while the row is still in this status
    pub from: TransactionStatus,
    pub to: TransactionStatus,
    pub flag_reason: Option<FlagReason>,
    pub reported_amount: Option<Money>,
    pub receipt_number: Option<String>,
    pub decided_by: Option<Snowflake>,
    pub decision_notes: Option<String>,
    pub at: DateTime<Utc>,
}

/// Completion of a transaction plus the credit of its obligation
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub transaction_id: Snowflake,
    pub from: TransactionStatus,
    pub obligation_id: Option<Snowflake>,
    /// Stamped on the obligation as `payment_reference`
    pub reference: String,
    pub receipt_number: Option<String>,
    pub reported_amount: Option<Money>,
    pub decided_by: Option<Snowflake>,
    pub decision_notes: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementResult {
    /// False when the transaction had already left `from` (lost race or repeat delivery)
    pub applied: bool,
    /// False when the obligation was already paid by another transaction
    pub obligation_credited: bool,
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a transaction, with an audit entry when given.
    ///
    /// A tracking id that already exists fails with [`DomainError::DuplicateTrackingId`].
    async fn create(
        &self,
        transaction: &PaymentTransaction,
        audit: Option<&AuditLogEntry>,
    ) -> RepoResult<()>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<PaymentTransaction>>;

    async fn find_by_tracking_id(&self, tracking_id: &str)
        -> RepoResult<Option<PaymentTransaction>>;

    async fn find_by_obligation(
        &self,
        obligation_id: Snowflake,
    ) -> RepoResult<Vec<PaymentTransaction>>;

    /// Oldest first
    async fn find_awaiting_approval(&self, limit: i64) -> RepoResult<Vec<PaymentTransaction>>;

    async fn count_by_status(&self, status: TransactionStatus) -> RepoResult<i64>;

    /// Attach the gateway-issued tracking id to a pending transaction
    async fn record_tracking_id(&self, id: Snowflake, tracking_id: &str) -> RepoResult<()>;

    /// Remember why the gateway call failed; the status is left untouched
    async fn record_initiation_error(&self, id: Snowflake, error: &str) -> RepoResult<()>;

    /// Apply `change` and append `audit` atomically, only if the row is still in
    /// `change.from`. Returns whether the row changed.
    async fn apply_change(
        &self,
        change: &TransactionChange,
        audit: &AuditLogEntry,
    ) -> RepoResult<bool>;

    /// Complete the transaction, credit its obligation and append `audit` atomically
    async fn settle(
        &self,
        settlement: &Settlement,
        audit: &AuditLogEntry,
    ) -> RepoResult<SettlementResult>;
}

// ============================================================================
// Audit Log Repository
// ============================================================================

/// Append-only: there is deliberately no update or delete
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, entry: &AuditLogEntry) -> RepoResult<()>;

    /// Newest first, strictly older than `before` when given
    async fn list(&self, before: Option<Snowflake>, limit: i64) -> RepoResult<Vec<AuditLogEntry>>;
}
