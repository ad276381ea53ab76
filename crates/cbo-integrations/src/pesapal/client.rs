//! Pesapal REST client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use cbo_common::PesapalConfig;
use cbo_core::entities::PaymentChannel;
use cbo_core::error::DomainError;
use cbo_core::reconciliation::{GatewayOutcome, GatewayResult};
use cbo_core::traits::{ChargeRequest, ChargeStarted, PaymentGateway};
use cbo_core::value_objects::Money;

use crate::error::{IntegrationError, IntegrationResult};
use crate::http::{build_client, read_json, transport};

const PROVIDER: &str = "pesapal";

/// Pesapal tokens live five minutes
const TOKEN_LIFETIME: Duration = Duration::from_secs(240);

const CURRENCY: &str = "KES";
const DESCRIPTION_MAX: usize = 100;

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
}

/// Envelope fields Pesapal adds to every answer
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Serialize)]
struct BillingAddress<'a> {
    email_address: Option<&'a str>,
    phone_number: Option<&'a str>,
    first_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SubmitOrderRequest<'a> {
    id: String,
    currency: &'static str,
    amount: f64,
    description: String,
    callback_url: &'a str,
    notification_id: &'a str,
    billing_address: BillingAddress<'a>,
}

#[derive(Debug, Deserialize)]
struct SubmitOrderResponse {
    #[serde(default)]
    order_tracking_id: Option<String>,
    #[serde(default)]
    redirect_url: Option<String>,
    #[serde(default)]
    error: Option<ApiError>,
}

/// `GetTransactionStatus` answer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionStatusResponse {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub confirmation_code: Option<String>,
    #[serde(default)]
    pub payment_status_description: Option<String>,
    /// 0 invalid, 1 completed, 2 failed, 3 reversed
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub payment_account: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub merchant_reference: Option<String>,
}

/// Turn a status answer into a gateway result; `None` while the order is unpaid
pub fn status_result(
    tracking_id: &str,
    status: &TransactionStatusResponse,
    raw: Value,
) -> Option<GatewayResult> {
    let outcome = status
        .payment_status_description
        .as_deref()
        .and_then(GatewayOutcome::normalize)
        .or(match status.status_code {
            Some(1) => Some(GatewayOutcome::Success),
            Some(2 | 3) => Some(GatewayOutcome::Failed),
            _ => None,
        })?;

    let mut result = GatewayResult::new(PaymentChannel::Pesapal, tracking_id, outcome);
    result.amount = status.amount.and_then(Money::from_major);
    result.receipt = status.confirmation_code.clone().filter(|c| !c.is_empty());
    result.phone = status.payment_account.clone();
    result.description = status.description.clone();
    result.raw = raw;
    Some(result)
}

fn api_error(error: Option<ApiError>, fallback: &str) -> IntegrationError {
    let error = error.unwrap_or_default();
    IntegrationError::Rejected {
        provider: PROVIDER,
        status: 200,
        message: error
            .message
            .or(error.code)
            .unwrap_or_else(|| fallback.to_string()),
    }
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Hosted checkout gateway
pub struct PesapalClient {
    http: Client,
    config: PesapalConfig,
    token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for PesapalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PesapalClient")
            .field("ipn_id", &self.config.ipn_id)
            .field("environment", &self.config.environment)
            .finish_non_exhaustive()
    }
}

impl PesapalClient {
    pub fn new(config: PesapalConfig) -> IntegrationResult<Self> {
        Ok(Self {
            http: build_client()?,
            config,
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }

    async fn access_token(&self) -> IntegrationResult<String> {
        let cached = self
            .token
            .lock()
            .as_ref()
            .filter(|t| Instant::now() < t.refresh_at)
            .map(|t| t.value.clone());
        if let Some(token) = cached {
            return Ok(token);
        }

        let response = self
            .http
            .post(self.url("/api/Auth/RequestToken"))
            .json(&TokenRequest {
                consumer_key: &self.config.consumer_key,
                consumer_secret: &self.config.consumer_secret,
            })
            .send()
            .await
            .map_err(transport(PROVIDER))?;
        let answer: TokenResponse = read_json(PROVIDER, response).await?;
        let token = answer
            .token
            .ok_or_else(|| api_error(answer.error, "no token issued"))?;

        *self.token.lock() = Some(CachedToken {
            value: token.clone(),
            refresh_at: Instant::now() + TOKEN_LIFETIME,
        });
        debug!("Refreshed Pesapal access token");

        Ok(token)
    }

    #[instrument(skip(self, request), fields(transaction_id = %request.transaction_id))]
    async fn submit_order(&self, request: &ChargeRequest) -> IntegrationResult<ChargeStarted> {
        let body = SubmitOrderRequest {
            // Merchant reference: our transaction id, echoed back in the IPN
            id: request.transaction_id.to_string(),
            currency: CURRENCY,
            amount: request.amount.to_major(),
            description: request.description.chars().take(DESCRIPTION_MAX).collect(),
            callback_url: &self.config.callback_url,
            notification_id: &self.config.ipn_id,
            billing_address: BillingAddress {
                email_address: request.email.as_deref(),
                phone_number: request.phone.as_ref().map(|p| p.as_str()),
                first_name: request.payer_name.as_deref(),
            },
        };

        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.url("/api/Transactions/SubmitOrderRequest"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(transport(PROVIDER))?;
        let answer: SubmitOrderResponse = read_json(PROVIDER, response).await?;

        let tracking_id = answer
            .order_tracking_id
            .ok_or_else(|| api_error(answer.error, "order was not accepted"))?;

        Ok(ChargeStarted {
            tracking_id,
            redirect_url: answer.redirect_url,
            message: None,
        })
    }

    /// Authoritative order status; the IPN itself is never trusted
    #[instrument(skip(self))]
    pub async fn transaction_status(
        &self,
        tracking_id: &str,
    ) -> IntegrationResult<Option<GatewayResult>> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(self.url("/api/Transactions/GetTransactionStatus"))
            .query(&[("orderTrackingId", tracking_id)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport(PROVIDER))?;
        let raw: Value = read_json(PROVIDER, response).await?;
        let status: TransactionStatusResponse = serde_json::from_value(raw.clone())
            .map_err(|e| IntegrationError::invalid(PROVIDER, e.to_string()))?;

        Ok(status_result(tracking_id, &status, raw))
    }
}

#[async_trait]
impl PaymentGateway for PesapalClient {
    fn channel(&self) -> PaymentChannel {
        PaymentChannel::Pesapal
    }

    async fn start_charge(&self, request: &ChargeRequest) -> Result<ChargeStarted, DomainError> {
        Ok(self.submit_order(request).await?)
    }

    async fn query_status(&self, tracking_id: &str) -> Result<Option<GatewayResult>, DomainError> {
        Ok(self.transaction_status(tracking_id).await?)
    }
}
