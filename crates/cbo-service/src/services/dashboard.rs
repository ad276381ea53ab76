//! Dashboard service
//!
//! Statistics are computed from the repositories and cached as JSON under explicit keys.
//! Every mutation of obligations or transactions calls [`DashboardService::invalidate_for`]
//! for the members it touched. A failing cache never fails a request: reads fall back to
//! computing, and failed invalidations are logged.

use cbo_cache::StatsKey;
use cbo_core::{ObligationTotals, Permissions, Snowflake, TransactionStatus};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use crate::dto::{MemberSummary, OrgSummary};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::session::SessionContext;

/// Dashboard statistics service
pub struct DashboardService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DashboardService<'a> {
    /// Create a new DashboardService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Organisation-wide totals
    #[instrument(skip(self, session))]
    pub async fn org_summary(&self, session: &SessionContext) -> ServiceResult<OrgSummary> {
        session.require(Permissions::VIEW_FINANCIAL_REPORTS)?;

        let key = StatsKey::Org.to_string();
        if let Some(summary) = self.cached::<OrgSummary>(&key).await {
            return Ok(summary);
        }

        let totals = self.ctx.obligation_repo().totals(None).await?;
        let awaiting_approval_count = self
            .ctx
            .payment_repo()
            .count_by_status(TransactionStatus::AwaitingApproval)
            .await?;
        let member_count = self.ctx.profile_repo().list_member_ids().await?.len();

        let summary = OrgSummary {
            expected: totals.expected,
            collected: totals.collected,
            outstanding: totals.outstanding,
            pending_count: totals.pending_count,
            paid_count: totals.paid_count,
            missed_count: totals.missed_count,
            awaiting_approval_count,
            member_count,
            collection_rate: collection_rate(&totals),
            generated_at: Utc::now(),
        };

        self.store(&key, &summary).await;
        Ok(summary)
    }

    /// The caller's own totals
    #[instrument(skip(self, session))]
    pub async fn member_summary(&self, session: &SessionContext) -> ServiceResult<MemberSummary> {
        let member_id = session.user_id();
        let key = StatsKey::Member(member_id).to_string();
        if let Some(summary) = self.cached::<MemberSummary>(&key).await {
            return Ok(summary);
        }

        let totals = self.ctx.obligation_repo().totals(Some(member_id)).await?;
        let summary = MemberSummary {
            member_id: member_id.to_string(),
            expected: totals.expected,
            collected: totals.collected,
            outstanding: totals.outstanding,
            pending_count: totals.pending_count,
            paid_count: totals.paid_count,
            missed_count: totals.missed_count,
            collection_rate: collection_rate(&totals),
            generated_at: Utc::now(),
        };

        self.store(&key, &summary).await;
        Ok(summary)
    }

    /// Drop the organisation snapshot and `member_id`'s snapshot
    pub async fn invalidate_for(&self, member_id: Snowflake) {
        self.invalidate_keys(StatsKey::for_member(member_id)).await;
    }

    /// Drop the organisation snapshot and the snapshots of every member given
    pub async fn invalidate_for_members(&self, member_ids: impl IntoIterator<Item = Snowflake>) {
        let mut keys = vec![StatsKey::Org.to_string()];
        keys.extend(member_ids.into_iter().map(|id| StatsKey::Member(id).to_string()));
        keys.sort();
        keys.dedup();
        self.invalidate_keys(keys).await;
    }

    async fn invalidate_keys(&self, keys: Vec<String>) {
        if let Err(e) = self.ctx.stats_cache().invalidate(&keys).await {
            warn!(error = %e, keys = keys.len(), "Failed to invalidate dashboard stats");
        }
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.ctx.stats_cache().get(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => {
                    debug!(key, "Dashboard stats cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "Discarding unreadable dashboard stats");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Dashboard stats cache unavailable");
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize dashboard stats");
                return;
            }
        };
        let ttl = self.ctx.portal().stats_ttl_secs;
        if let Err(e) = self.ctx.stats_cache().put(key, &json, ttl).await {
            warn!(key, error = %e, "Failed to cache dashboard stats");
        }
    }
}

/// Percentage of due obligations (paid or missed) that were paid; 0 when nothing is due
pub fn collection_rate(totals: &ObligationTotals) -> f64 {
    let due = totals.paid_count + totals.missed_count;
    if due <= 0 {
        return 0.0;
    }
    ((totals.paid_count * 1000) as f64 / due as f64).round() / 10.0
}
