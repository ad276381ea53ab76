//! Snowflake identifiers for members, obligations, transactions and audit entries.
//!
//! Layout (64 bits, sign bit always clear):
//! - Bits 62-22: milliseconds since [`Snowflake::EPOCH`]
//! - Bits 21-12: node id (0-1023)
//! - Bits 11-0:  per-millisecond counter

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

/// Time-ordered 64-bit identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(i64);

impl Snowflake {
    /// 2025-01-01 00:00:00 UTC in milliseconds
    pub const EPOCH: i64 = 1_735_689_600_000;

    const NODE_BITS: u32 = 10;
    const COUNTER_BITS: u32 = 12;
    const COUNTER_MASK: i64 = (1 << Self::COUNTER_BITS) - 1;

    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Milliseconds since the Unix epoch encoded in this id
    #[inline]
    pub fn timestamp_millis(&self) -> i64 {
        (self.0 >> (Self::NODE_BITS + Self::COUNTER_BITS)) + Self::EPOCH
    }

    #[inline]
    pub fn node_id(&self) -> u16 {
        ((self.0 >> Self::COUNTER_BITS) & 0x3FF) as u16
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp_millis())
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        match s.trim().parse::<i64>() {
            Ok(v) if v >= 0 => Ok(Self(v)),
            _ => Err(SnowflakeParseError::InvalidFormat),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("invalid identifier format")]
    InvalidFormat,
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Snowflake {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for i64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl std::str::FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Snowflake::parse(s)
    }
}

// Strings on the wire: browsers lose precision above 2^53
impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(Snowflake(v)),
            Raw::Str(s) => Snowflake::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// Lock-free id generator.
///
/// The last issued `(millis, counter)` pair lives in one atomic word so concurrent callers
/// never hand out the same id.
pub struct SnowflakeGenerator {
    node_id: u16,
    state: AtomicI64,
}

impl SnowflakeGenerator {
    /// # Panics
    /// Panics if `node_id >= 1024`
    pub fn new(node_id: u16) -> Self {
        assert!(node_id < 1024, "node id must be < 1024");
        Self {
            node_id,
            state: AtomicI64::new(0),
        }
    }

    pub fn generate(&self) -> Snowflake {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let now = (Utc::now().timestamp_millis() - Snowflake::EPOCH).max(0);
            let last_millis = current >> Snowflake::COUNTER_BITS;
            let last_counter = current & Snowflake::COUNTER_MASK;

            // Never step backwards; borrow from the future when the counter overflows
            let next = if now > last_millis {
                now << Snowflake::COUNTER_BITS
            } else if last_counter < Snowflake::COUNTER_MASK {
                current + 1
            } else {
                (last_millis + 1) << Snowflake::COUNTER_BITS
            };

            match self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    let millis = next >> Snowflake::COUNTER_BITS;
                    let counter = next & Snowflake::COUNTER_MASK;
                    return Snowflake::new(
                        (millis << (Snowflake::NODE_BITS + Snowflake::COUNTER_BITS))
                            | (i64::from(self.node_id) << Snowflake::COUNTER_BITS)
                            | counter,
                    );
                }
                Err(actual) => current = actual,
            }
        }
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
