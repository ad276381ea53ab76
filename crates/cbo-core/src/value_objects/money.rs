//! Money amounts in minor units (cents)
//!
//! Shillings are exchanged with gateways and the UI as decimal numbers; internally every amount
//! is an integer count of cents so comparisons are exact.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    #[inline]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Convert a decimal major-unit amount, rounding to the nearest cent.
    ///
    /// Returns `None` for NaN, infinities and values outside the representable range.
    pub fn from_major(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents.abs() > 9.0e15 {
            return None;
        }
        Some(Self(cents as i64))
    }

    /// True when the amount has no cents part
    #[inline]
    pub const fn is_whole_units(self) -> bool {
        self.0 % 100 == 0
    }

    /// Whole shillings, as M-Pesa expects (rounded up so a charge never undershoots)
    pub fn whole_units_ceil(self) -> i64 {
        self.0.div_euclid(100) + i64::from(self.0.rem_euclid(100) != 0)
    }

    #[inline]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.to_major())
    }
}

// Accepts 1500, 1500.5 or "1500.50"
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(f64),
            Str(String),
        }

        let value = match Raw::deserialize(deserializer)? {
            Raw::Num(n) => n,
            Raw::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom("invalid amount"))?,
        };
        Money::from_major(value).ok_or_else(|| serde::de::Error::custom("invalid amount"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_rounds_to_cents() {
        assert_eq!(Money::from_major(1000.0), Some(Money::from_cents(100_000)));
        assert_eq!(Money::from_major(1500.5), Some(Money::from_cents(150_050)));
        assert_eq!(Money::from_major(0.125), Some(Money::from_cents(13)));
        assert_eq!(Money::from_major(f64::NAN), None);
        assert_eq!(Money::from_major(f64::INFINITY), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(150_050).to_string(), "1500.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
    }

    #[test]
    fn test_whole_units_ceil() {
        assert_eq!(Money::from_cents(100_000).whole_units_ceil(), 1000);
        assert_eq!(Money::from_cents(100_001).whole_units_ceil(), 1001);
    }

    #[test]
    fn test_is_whole_units() {
        assert!(Money::from_cents(100_000).is_whole_units());
        assert!(!Money::from_cents(100_050).is_whole_units());
    }

    #[test]
    fn test_serializes_as_number() {
        let value = serde_json::to_value(Money::from_cents(150_050)).unwrap();
        assert_eq!(value, serde_json::json!(1500.5));
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let a: Money = serde_json::from_str("1500").unwrap();
        let b: Money = serde_json::from_str("\"1500.00\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cents(), 150_000);
        assert!(serde_json::from_str::<Money>("\"ten\"").is_err());
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_cents(1), Money::from_cents(2)].into_iter().sum();
        assert_eq!(total, Money::from_cents(3));
    }
}
