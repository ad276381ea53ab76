//! E.164 phone numbers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Country calling code used when a number is written in national format
pub const DEFAULT_COUNTRY_CODE: &str = "254";

/// Subscriber digits after the country code for the default country
const NATIONAL_LEN: usize = 9;

/// A phone number normalized to E.164 (`+254712345678`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid phone number: {0}")]
pub struct InvalidPhoneNumber(pub String);

impl PhoneNumber {
    /// Normalize a user-entered number.
    ///
    /// Accepts `0712345678`, `712345678`, `254712345678` and `+254 712 345 678` style input
    /// (spaces, dashes and parentheses are ignored). Numbers already carrying a different
    /// country code must be written with a leading `+`.
    pub fn normalize(raw: &str, country_code: &str) -> Result<Self, InvalidPhoneNumber> {
        let invalid = || InvalidPhoneNumber(raw.to_string());
        let trimmed = raw.trim();
        let (explicit_plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '(' | ')' | '.' => {}
                _ => return Err(invalid()),
            }
        }

        let e164 = if explicit_plus {
            digits
        } else if let Some(national) = digits.strip_prefix(country_code) {
            if national.len() != NATIONAL_LEN {
                return Err(invalid());
            }
            digits
        } else if let Some(national) = digits.strip_prefix('0') {
            if national.len() != NATIONAL_LEN {
                return Err(invalid());
            }
            format!("{country_code}{national}")
        } else if digits.len() == NATIONAL_LEN {
            format!("{country_code}{digits}")
        } else {
            return Err(invalid());
        };

        // E.164 allows at most 15 digits
        if !(8..=15).contains(&e164.len()) || e164.starts_with('0') {
            return Err(invalid());
        }
        if e164.starts_with(country_code) && e164.len() != country_code.len() + NATIONAL_LEN {
            return Err(invalid());
        }

        Ok(Self(format!("+{e164}")))
    }

    /// Normalize using [`DEFAULT_COUNTRY_CODE`]
    pub fn parse(raw: &str) -> Result<Self, InvalidPhoneNumber> {
        Self::normalize(raw, DEFAULT_COUNTRY_CODE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits without the leading `+` (`254712345678`), the form M-Pesa expects
    pub fn digits(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = InvalidPhoneNumber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_kenyan_formats() {
        for raw in [
            "0712345678",
            "712345678",
            "254712345678",
            "+254 712 345 678",
            "+254-712-345-678",
        ] {
            assert_eq!(
                PhoneNumber::parse(raw).unwrap().as_str(),
                "+254712345678",
                "input {raw}"
            );
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for raw in ["", "07123", "07123456789", "0712abc678", "2547123456", "+0123456789"] {
            assert!(PhoneNumber::parse(raw).is_err(), "input {raw}");
        }
    }

    #[test]
    fn test_foreign_number_with_plus() {
        let phone = PhoneNumber::parse("+44 20 7946 0958").unwrap();
        assert_eq!(phone.as_str(), "+442079460958");
    }

    #[test]
    fn test_digits() {
        assert_eq!(PhoneNumber::parse("0712345678").unwrap().digits(), "254712345678");
    }

    #[test]
    fn test_custom_country_code() {
        let phone = PhoneNumber::normalize("0772123456", "256").unwrap();
        assert_eq!(phone.as_str(), "+256772123456");
    }
}
