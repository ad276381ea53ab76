//! Path parameter extractors
//!
//! Snowflake ids arrive as strings and are parsed here so handlers get typed ids.

use cbo_core::Snowflake;
use serde::Deserialize;

use crate::response::ApiError;

fn parse_snowflake(raw: &str, name: &str) -> Result<Snowflake, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::invalid_path(format!("Invalid {name} format")))
}

/// `/{id}` on obligations and payments
#[derive(Debug, Deserialize)]
pub struct IdPath {
    pub id: String,
}

impl IdPath {
    pub fn id(&self) -> Result<Snowflake, ApiError> {
        parse_snowflake(&self.id, "id")
    }
}

/// `/members/{user_id}/...`
#[derive(Debug, Deserialize)]
pub struct MemberPath {
    pub user_id: String,
}

impl MemberPath {
    pub fn user_id(&self) -> Result<Snowflake, ApiError> {
        parse_snowflake(&self.user_id, "user_id")
    }
}

/// `/members/{user_id}/roles/{role}`
#[derive(Debug, Deserialize)]
pub struct MemberRolePath {
    pub user_id: String,
    pub role: String,
}

impl MemberRolePath {
    pub fn user_id(&self) -> Result<Snowflake, ApiError> {
        parse_snowflake(&self.user_id, "user_id")
    }

    pub fn role(&self) -> &str {
        &self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member_path() {
        let path = MemberRolePath {
            user_id: "1234567890".into(),
            role: "treasurer".into(),
        };
        assert_eq!(path.user_id().unwrap(), Snowflake::new(1_234_567_890));
        assert_eq!(path.role(), "treasurer");
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        let path = IdPath { id: "abc".into() };
        let err = path.id().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PATH_PARAMETER");
    }
}
