//! SMS one-time codes through Twilio Verify

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use cbo_common::SmsConfig;
use cbo_core::error::DomainError;
use cbo_core::traits::SmsVerifier;
use cbo_core::value_objects::PhoneNumber;

use crate::error::IntegrationResult;
use crate::http::{build_client, read_json, transport};

const PROVIDER: &str = "sms";

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    /// `pending`, `approved`, `canceled`
    status: String,
}

pub struct TwilioVerifyClient {
    http: Client,
    config: SmsConfig,
}

impl std::fmt::Debug for TwilioVerifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioVerifyClient")
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}

impl TwilioVerifyClient {
    pub fn new(config: SmsConfig) -> IntegrationResult<Self> {
        Ok(Self {
            http: build_client()?,
            config,
        })
    }

    fn service_url(&self, resource: &str) -> String {
        format!(
            "{}/Services/{}/{resource}",
            self.config.api_url.trim_end_matches('/'),
            self.config.verify_service_sid
        )
    }

    async fn post(&self, resource: &str, form: &[(&str, &str)]) -> IntegrationResult<VerificationResponse> {
        let response = self
            .http
            .post(self.service_url(resource))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await
            .map_err(transport(PROVIDER))?;
        read_json(PROVIDER, response).await
    }
}

#[async_trait]
impl SmsVerifier for TwilioVerifyClient {
    #[instrument(skip(self, phone))]
    async fn send_code(&self, phone: &PhoneNumber) -> Result<String, DomainError> {
        let answer = self
            .post("Verifications", &[("To", phone.as_str()), ("Channel", "sms")])
            .await?;
        Ok(answer.status)
    }

    #[instrument(skip(self, phone, code))]
    async fn check_code(&self, phone: &PhoneNumber, code: &str) -> Result<bool, DomainError> {
        let answer = self
            .post("VerificationCheck", &[("To", phone.as_str()), ("Code", code)])
            .await?;
        Ok(answer.status == "approved")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_url() {
        let client = TwilioVerifyClient::new(SmsConfig {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            verify_service_sid: "VA456".to_string(),
            api_url: "https://verify.twilio.com/v2/".to_string(),
        })
        .unwrap();
        assert_eq!(
            client.service_url("VerificationCheck"),
            "https://verify.twilio.com/v2/Services/VA456/VerificationCheck"
        );
    }
}
