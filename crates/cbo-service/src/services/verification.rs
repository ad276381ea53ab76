//! SMS verification service

use cbo_core::{DomainError, PhoneNumber};
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::dto::{SmsAction, SmsVerificationRequest, SmsVerificationResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::session::SessionContext;

/// Verification service
pub struct VerificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VerificationService<'a> {
    /// Create a new VerificationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Send a code to, or check a code for, the caller's phone.
    ///
    /// Input is validated before the provider is contacted. An approved check stamps the
    /// caller's profile as phone-verified.
    #[instrument(skip(self, session, request), fields(user_id = %session.user_id()))]
    pub async fn handle_sms(
        &self,
        session: &SessionContext,
        request: SmsVerificationRequest,
    ) -> ServiceResult<SmsVerificationResponse> {
        let phone = PhoneNumber::normalize(&request.phone, &self.ctx.portal().default_country_code)
            .map_err(DomainError::from)?;

        match request.action {
            SmsAction::Send => {
                let sms = self.ctx.sms()?;
                let status = sms
                    .send_code(&phone)
                    .await
                    .map_err(|e| ServiceError::external(e.to_string()))?;

                info!(phone = %phone, status = %status, "Verification code sent");
                Ok(SmsVerificationResponse {
                    phone: phone.as_str().to_string(),
                    status,
                    verified: None,
                })
            }
            SmsAction::Verify => {
                let code = request
                    .code
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| is_valid_code(c))
                    .ok_or_else(|| ServiceError::validation("Code must be 4-10 digits"))?;

                let sms = self.ctx.sms()?;
                let approved = sms
                    .check_code(&phone, code)
                    .await
                    .map_err(|e| ServiceError::external(e.to_string()))?;

                if approved {
                    self.ctx
                        .profile_repo()
                        .mark_phone_verified(session.user_id(), Utc::now())
                        .await?;
                    info!(phone = %phone, "Phone verified");
                } else {
                    warn!(phone = %phone, "Verification code rejected");
                }

                Ok(SmsVerificationResponse {
                    phone: phone.as_str().to_string(),
                    status: if approved { "approved" } else { "pending" }.to_string(),
                    verified: Some(approved),
                })
            }
        }
    }
}

fn is_valid_code(code: &str) -> bool {
    (4..=10).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestHarness, FAKE_SMS_CODE};
    use cbo_core::{MemberRole, Snowflake};

    fn request(action: SmsAction, phone: &str, code: Option<&str>) -> SmsVerificationRequest {
        SmsVerificationRequest {
            action,
            phone: phone.into(),
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_code_format() {
        assert!(is_valid_code("1234"));
        assert!(is_valid_code("1234567890"));
        assert!(!is_valid_code("123"));
        assert!(!is_valid_code("12345678901"));
        assert!(!is_valid_code("12a4"));
    }

    #[tokio::test]
    async fn test_send_normalizes_phone() {
        let h = TestHarness::new();
        let session = h.session(Snowflake::new(900), &[MemberRole::Member]);

        let response = VerificationService::new(&h.ctx)
            .handle_sms(&session, request(SmsAction::Send, "0712 345 678", None))
            .await
            .unwrap();

        assert_eq!(response.phone, "+254712345678");
        assert_eq!(response.status, "pending");
        assert_eq!(h.sms.sent_to(), vec!["+254712345678".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_provider() {
        let h = TestHarness::new();
        let session = h.session(Snowflake::new(901), &[MemberRole::Member]);
        let service = VerificationService::new(&h.ctx);

        let err = service
            .handle_sms(&session, request(SmsAction::Send, "07123abc45", None))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = service
            .handle_sms(&session, request(SmsAction::Verify, "0712345678", Some("12")))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(h.sms.sent_to().is_empty());
        assert_eq!(h.sms.checks(), 0);
    }

    #[tokio::test]
    async fn test_approved_code_marks_phone_verified() {
        let h = TestHarness::new();
        let user = Snowflake::new(902);
        h.seed_profile(user, "phone@example.org");
        let session = h.session(user, &[MemberRole::Member]);

        let response = VerificationService::new(&h.ctx)
            .handle_sms(&session, request(SmsAction::Verify, "0712345678", Some(FAKE_SMS_CODE)))
            .await
            .unwrap();

        assert_eq!(response.verified, Some(true));
        assert!(h.store.profile(user).is_phone_verified());
    }

    #[tokio::test]
    async fn test_wrong_code_is_not_an_error() {
        let h = TestHarness::new();
        let user = Snowflake::new(903);
        h.seed_profile(user, "phone@example.org");
        let session = h.session(user, &[MemberRole::Member]);

        let response = VerificationService::new(&h.ctx)
            .handle_sms(&session, request(SmsAction::Verify, "0712345678", Some("000000")))
            .await
            .unwrap();

        assert_eq!(response.verified, Some(false));
        assert!(!h.store.profile(user).is_phone_verified());
    }

    #[tokio::test]
    async fn test_sms_unavailable_without_provider() {
        let h = TestHarness::without_providers();
        let session = h.session(Snowflake::new(904), &[MemberRole::Member]);
        let err = VerificationService::new(&h.ctx)
            .handle_sms(&session, request(SmsAction::Send, "0712345678", None))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 503);
    }
}
