//! Profile entity <-> model mapper

use cbo_core::entities::Profile;
use cbo_core::error::DomainError;
use cbo_core::value_objects::{PhoneNumber, Snowflake};

use super::corrupt_column;
use crate::models::ProfileModel;

impl TryFrom<ProfileModel> for Profile {
    type Error = DomainError;

    fn try_from(model: ProfileModel) -> Result<Self, Self::Error> {
        let phone = model
            .phone
            .map(|raw| PhoneNumber::parse(&raw).map_err(|_| corrupt_column("profiles.phone", &raw)))
            .transpose()?;

        Ok(Profile {
            user_id: Snowflake::new(model.user_id),
            full_name: model.full_name,
            email: model.email,
            phone,
            id_number: model.id_number,
            email_confirmed_at: model.email_confirmed_at,
            phone_verified_at: model.phone_verified_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn model(phone: Option<&str>) -> ProfileModel {
        let now = Utc::now();
        ProfileModel {
            user_id: 42,
            full_name: Some("Wanjiru Kamau".to_string()),
            email: "wanjiru@example.org".to_string(),
            phone: phone.map(str::to_string),
            id_number: None,
            email_confirmed_at: Some(now),
            phone_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_profile_from_model() {
        let profile = Profile::try_from(model(Some("+254712345678"))).unwrap();
        assert_eq!(profile.user_id, Snowflake::new(42));
        assert_eq!(profile.phone.as_ref().unwrap().as_str(), "+254712345678");
        assert!(profile.is_email_confirmed());
    }

    #[test]
    fn test_profile_with_garbage_phone_is_rejected() {
        let err = Profile::try_from(model(Some("not a phone"))).unwrap_err();
        assert!(matches!(err, DomainError::DatabaseError(_)));
    }
}
