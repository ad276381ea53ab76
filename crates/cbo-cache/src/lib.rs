//! # cbo-cache
//!
//! Redis caching layer for dashboard statistics.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Statistics Cache**: JSON snapshots under explicit keys (`stats:org`, `stats:member:{id}`)
//!   with a TTL, dropped explicitly whenever obligations or transactions change
//!
//! ## Example
//!
//! ```ignore
//! use cbo_cache::{RedisPool, RedisStatsCache, StatsKey};
//!
//! let pool = RedisPool::from_config(&config.redis)?;
//! let stats = RedisStatsCache::new(pool.clone());
//!
//! stats.put(&StatsKey::Org.to_string(), &json, 300).await?;
//! stats.invalidate(&StatsKey::for_member(member_id)).await?;
//! ```

pub mod pool;
pub mod stats;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export stats types
pub use stats::{RedisStatsCache, StatsKey, STATS_KEY_PREFIX};
