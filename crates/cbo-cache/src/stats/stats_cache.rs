//! Read-through cache for dashboard statistics.
//!
//! Values are opaque JSON strings produced by the service layer. Keys are explicit so that
//! every mutation knows exactly which snapshots it makes stale.

use async_trait::async_trait;
use std::fmt;

use cbo_core::error::DomainError;
use cbo_core::traits::StatsCache;
use cbo_core::value_objects::Snowflake;

use crate::pool::{RedisPool, RedisPoolError};

/// Key prefix for statistics snapshots
pub const STATS_KEY_PREFIX: &str = "stats:";

/// Cache key of one statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsKey {
    /// Organisation-wide summary
    Org,
    /// One member's own summary
    Member(Snowflake),
}

impl StatsKey {
    /// Keys made stale by a change to `member_id`'s obligations or payments
    pub fn for_member(member_id: Snowflake) -> Vec<String> {
        vec![Self::Org.to_string(), Self::Member(member_id).to_string()]
    }
}

impl fmt::Display for StatsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Org => write!(f, "{STATS_KEY_PREFIX}org"),
            Self::Member(id) => write!(f, "{STATS_KEY_PREFIX}member:{id}"),
        }
    }
}

impl From<RedisPoolError> for DomainError {
    fn from(e: RedisPoolError) -> Self {
        DomainError::CacheError(e.to_string())
    }
}

/// Redis-backed [`StatsCache`]
#[derive(Clone, Debug)]
pub struct RedisStatsCache {
    pool: RedisPool,
}

impl RedisStatsCache {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsCache for RedisStatsCache {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.pool.get_string(key).await?)
    }

    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), DomainError> {
        // A zero TTL would be rejected by SETEX
        let ttl = Some(ttl_secs.max(1));
        self.pool.set_string(key, value, ttl).await?;
        Ok(())
    }

    async fn invalidate(&self, keys: &[String]) -> Result<(), DomainError> {
        let deleted = self.pool.delete_many(keys).await?;
        tracing::debug!(?keys, deleted, "Invalidated statistics cache");
        Ok(())
    }
}
