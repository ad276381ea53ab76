//! Dashboard statistics cache.

mod stats_cache;

pub use stats_cache::{RedisStatsCache, StatsKey, STATS_KEY_PREFIX};
