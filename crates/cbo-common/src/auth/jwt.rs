//! Session tokens
//!
//! Access tokens are issued by the auth provider with the shared secret; this service
//! validates them and issues short-lived recovery tokens for account-recovery links.

use cbo_core::Snowflake;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Provider tokens carry no type claim and are access tokens
    #[default]
    Access,
    Recovery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Member id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub token_type: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Set by the auth provider once the address has been confirmed
    #[serde(default)]
    pub email_verified: bool,
}

impl Claims {
    pub fn user_id(&self) -> Result<Snowflake, AppError> {
        Snowflake::parse(&self.sub).map_err(|_| AppError::InvalidToken)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry: i64,
    recovery_token_expiry: i64,
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str, access_token_expiry: i64, recovery_token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry,
            recovery_token_expiry,
        }
    }

    /// Issue an access token (used by tooling and tests; production tokens come from the
    /// auth provider). A token carrying an email vouches for it.
    pub fn issue_access_token(
        &self,
        user_id: Snowflake,
        email: Option<String>,
    ) -> Result<String, AppError> {
        self.encode_token(user_id, TokenType::Access, email, self.access_token_expiry)
    }

    /// Issue a recovery token embedded in a password-reset link
    pub fn issue_recovery_token(&self, user_id: Snowflake, email: &str) -> Result<String, AppError> {
        self.encode_token(
            user_id,
            TokenType::Recovery,
            Some(email.to_string()),
            self.recovery_token_expiry,
        )
    }

    #[must_use]
    pub fn recovery_token_expiry(&self) -> i64 {
        self.recovery_token_expiry
    }

    fn encode_token(
        &self,
        user_id: Snowflake,
        token_type: TokenType,
        email: Option<String>,
        expiry: i64,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expiry)).timestamp(),
            token_type,
            email_verified: email.is_some() && token_type == TokenType::Access,
            email,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(anyhow::anyhow!("failed to encode token: {e}")))
    }

    /// Decode and validate signature and expiry
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        // Provider tokens carry an audience we do not pin
        validation.validate_aud = false;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            })
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;
        if claims.token_type != TokenType::Access {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    pub fn validate_recovery_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = self.decode_token(token)?;
        if claims.token_type != TokenType::Recovery {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("recovery_token_expiry", &self.recovery_token_expiry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret-key-that-is-long-enough", 900, 1800)
    }

    #[test]
    fn test_access_token_round_trip() {
        let svc = service();
        let token = svc
            .issue_access_token(Snowflake::new(42), Some("a@example.org".into()))
            .unwrap();
        let claims = svc.validate_access_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), Snowflake::new(42));
        assert_eq!(claims.email.as_deref(), Some("a@example.org"));
        assert!(claims.email_verified);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_recovery_token_is_not_an_access_token() {
        let svc = service();
        let token = svc
            .issue_recovery_token(Snowflake::new(42), "a@example.org")
            .unwrap();
        assert!(svc.validate_recovery_token(&token).is_ok());
        assert!(matches!(
            svc.validate_access_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_provider_token_without_type_is_access() {
        let claims = serde_json::json!({
            "sub": "7",
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 60,
        });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-that-is-long-enough"),
        )
        .unwrap();
        let decoded = service().validate_access_token(&token).unwrap();
        assert_eq!(decoded.user_id().unwrap(), Snowflake::new(7));
        assert!(!decoded.email_verified);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = JwtService::new("another-secret-key-entirely", 900, 1800)
            .issue_access_token(Snowflake::new(1), None)
            .unwrap();
        assert!(matches!(
            service().validate_access_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let token = JwtService::new("test-secret-key-that-is-long-enough", -120, 1800)
            .issue_access_token(Snowflake::new(1), None)
            .unwrap();
        assert!(matches!(
            service().validate_access_token(&token),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            service().decode_token("invalid.token.here"),
            Err(AppError::InvalidToken)
        ));
    }
}
