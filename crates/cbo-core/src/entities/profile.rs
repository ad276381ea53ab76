//! Profile entity - a member's personal details

use chrono::{DateTime, Utc};

use crate::value_objects::{PhoneNumber, Snowflake};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: Snowflake,
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<PhoneNumber>,
    pub id_number: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(user_id: Snowflake, email: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            full_name: None,
            email,
            phone: None,
            id_number: None,
            email_confirmed_at: None,
            phone_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name, phone and national id are all filled in
    pub fn is_complete(&self) -> bool {
        fn filled(value: Option<&String>) -> bool {
            value.is_some_and(|v| !v.trim().is_empty())
        }
        filled(self.full_name.as_ref()) && self.phone.is_some() && filled(self.id_number.as_ref())
    }

    #[inline]
    pub fn is_email_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }

    #[inline]
    pub fn is_phone_verified(&self) -> bool {
        self.phone_verified_at.is_some()
    }

    /// Changing the phone number drops its verification
    pub fn set_phone(&mut self, phone: PhoneNumber) {
        if self.phone.as_ref() != Some(&phone) {
            self.phone_verified_at = None;
        }
        self.phone = Some(phone);
        self.updated_at = Utc::now();
    }

    /// Name shown in emails and listings
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile::new(Snowflake::new(1), "wanjiku@example.org".to_string())
    }

    #[test]
    fn test_completeness() {
        let mut p = profile();
        assert!(!p.is_complete());

        p.full_name = Some("Wanjiku Kamau".into());
        p.id_number = Some("12345678".into());
        assert!(!p.is_complete());

        p.set_phone(PhoneNumber::parse("0712345678").unwrap());
        assert!(p.is_complete());

        p.full_name = Some("   ".into());
        assert!(!p.is_complete());
    }

    #[test]
    fn test_changing_phone_clears_verification() {
        let mut p = profile();
        p.set_phone(PhoneNumber::parse("0712345678").unwrap());
        p.phone_verified_at = Some(Utc::now());

        p.set_phone(PhoneNumber::parse("0712345678").unwrap());
        assert!(p.is_phone_verified());

        p.set_phone(PhoneNumber::parse("0799999999").unwrap());
        assert!(!p.is_phone_verified());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut p = profile();
        assert_eq!(p.display_name(), "wanjiku@example.org");
        p.full_name = Some("Wanjiku".into());
        assert_eq!(p.display_name(), "Wanjiku");
    }
}
