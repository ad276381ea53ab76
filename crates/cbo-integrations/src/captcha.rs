//! Server-side CAPTCHA token verification (hCaptcha / Turnstile siteverify contract)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{instrument, warn};

use cbo_common::CaptchaConfig;
use cbo_core::error::DomainError;
use cbo_core::traits::CaptchaVerifier;

use crate::error::IntegrationResult;
use crate::http::{build_client, read_json, transport};

const PROVIDER: &str = "captcha";

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

pub struct CaptchaClient {
    http: Client,
    config: CaptchaConfig,
}

impl std::fmt::Debug for CaptchaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaClient")
            .field("verify_url", &self.config.verify_url)
            .finish_non_exhaustive()
    }
}

impl CaptchaClient {
    pub fn new(config: CaptchaConfig) -> IntegrationResult<Self> {
        Ok(Self {
            http: build_client()?,
            config,
        })
    }
}

#[async_trait]
impl CaptchaVerifier for CaptchaClient {
    #[instrument(skip(self, token))]
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, DomainError> {
        let mut form = vec![("secret", self.config.secret.as_str()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = self
            .http
            .post(&self.config.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(transport(PROVIDER))?;
        let answer: SiteVerifyResponse = read_json(PROVIDER, response).await?;

        if !answer.success {
            warn!(error_codes = ?answer.error_codes, "CAPTCHA token rejected");
        }
        Ok(answer.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_response() {
        let answer: SiteVerifyResponse = serde_json::from_str(
            r#"{"success":false,"error-codes":["invalid-input-response"]}"#,
        )
        .unwrap();
        assert!(!answer.success);
        assert_eq!(answer.error_codes, vec!["invalid-input-response"]);
    }

    #[test]
    fn test_parse_success_without_error_codes() {
        let answer: SiteVerifyResponse =
            serde_json::from_str(r#"{"success":true,"hostname":"portal.example"}"#).unwrap();
        assert!(answer.success);
        assert!(answer.error_codes.is_empty());
    }
}
