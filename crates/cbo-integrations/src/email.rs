//! Transactional email over a Resend-compatible HTTP API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use cbo_common::EmailConfig;
use cbo_core::error::DomainError;
use cbo_core::traits::{EmailMessage, Mailer};

use crate::error::IntegrationResult;
use crate::http::{build_client, read_json, transport};

const PROVIDER: &str = "email";

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    #[serde(default)]
    id: Option<String>,
}

pub struct ResendMailer {
    http: Client,
    config: EmailConfig,
}

impl std::fmt::Debug for ResendMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendMailer")
            .field("from_address", &self.config.from_address)
            .finish_non_exhaustive()
    }
}

impl ResendMailer {
    pub fn new(config: EmailConfig) -> IntegrationResult<Self> {
        Ok(Self {
            http: build_client()?,
            config,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: &EmailMessage) -> Result<(), DomainError> {
        let body = SendEmailRequest {
            from: &self.config.from_address,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport(PROVIDER))?;
        let sent: SendEmailResponse = read_json(PROVIDER, response).await?;
        debug!(email_id = ?sent.id, "Email accepted by provider");

        Ok(())
    }
}
