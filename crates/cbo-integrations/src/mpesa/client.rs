//! Daraja REST client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, FixedOffset, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use cbo_common::MpesaConfig;
use cbo_core::entities::PaymentChannel;
use cbo_core::error::DomainError;
use cbo_core::reconciliation::{GatewayOutcome, GatewayResult};
use cbo_core::traits::{ChargeRequest, ChargeStarted, PaymentGateway};

use crate::error::{IntegrationError, IntegrationResult};
use crate::http::{build_client, read_json, transport};

const PROVIDER: &str = "mpesa";

/// Daraja timestamps are East Africa Time
const EAT_OFFSET_SECS: i32 = 3 * 3600;

/// Refresh the access token this long before Daraja expires it
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Daraja limits on free-text fields
const ACCOUNT_REFERENCE_MAX: usize = 12;
const TRANSACTION_DESC_MAX: usize = 13;

/// `yyyyMMddHHmmss` in East Africa Time
pub fn stk_timestamp(now: DateTime<Utc>) -> String {
    let eat = FixedOffset::east_opt(EAT_OFFSET_SECS).unwrap_or_else(|| unreachable!("valid offset"));
    now.with_timezone(&eat).format("%Y%m%d%H%M%S").to_string()
}

/// `base64(shortcode + passkey + timestamp)`
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    BASE64.encode(format!("{shortcode}{passkey}{timestamp}"))
}

fn clip(value: &str, max: usize) -> String {
    value.chars().filter(|c| c.is_ascii_alphanumeric() || *c == ' ').take(max).collect()
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Seconds, sent as a string
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StkPushRequest<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    transaction_type: &'static str,
    amount: i64,
    party_a: &'a str,
    party_b: &'a str,
    phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    callback_url: String,
    account_reference: String,
    transaction_desc: String,
}

#[derive(Debug, Deserialize)]
struct StkPushResponse {
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: String,
    #[serde(rename = "ResponseCode", default)]
    response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    response_description: String,
    #[serde(rename = "CustomerMessage", default)]
    customer_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StkQueryRequest<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct StkQueryResponse {
    #[serde(rename = "ResultCode", default)]
    result_code: Option<String>,
    #[serde(rename = "ResultDesc", default)]
    result_desc: Option<String>,
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

/// Error code Daraja answers with while the customer has not responded yet
const QUERY_IN_FLIGHT: &str = "500.001.1001";

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// STK push gateway
pub struct MpesaClient {
    http: Client,
    config: MpesaConfig,
    token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for MpesaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpesaClient")
            .field("shortcode", &self.config.shortcode)
            .field("environment", &self.config.environment)
            .finish_non_exhaustive()
    }
}

impl MpesaClient {
    pub fn new(config: MpesaConfig) -> IntegrationResult<Self> {
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
            .get(self.url("/oauth/v1/generate"))
            .query(&[("grant_type", "client_credentials")])
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await
            .map_err(transport(PROVIDER))?;
        let token: TokenResponse = read_json(PROVIDER, response).await?;

        let lifetime = token
            .expires_in
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map_or(Duration::from_secs(3599), Duration::from_secs);
        let refresh_at = Instant::now() + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN);

        *self.token.lock() = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at,
        });
        debug!("Refreshed M-Pesa access token");

        Ok(token.access_token)
    }

    #[instrument(skip(self, request), fields(transaction_id = %request.transaction_id))]
    async fn stk_push(&self, request: &ChargeRequest) -> IntegrationResult<ChargeStarted> {
        let phone = request
            .phone
            .as_ref()
            .ok_or_else(|| IntegrationError::invalid(PROVIDER, "phone number required"))?;
        let timestamp = stk_timestamp(Utc::now());
        let body = StkPushRequest {
            business_short_code: &self.config.shortcode,
            password: stk_password(&self.config.shortcode, &self.config.passkey, &timestamp),
            timestamp,
            transaction_type: "CustomerPayBillOnline",
            // Daraja only accepts whole shillings
            amount: request.amount.whole_units_ceil(),
            party_a: phone.digits(),
            party_b: &self.config.shortcode,
            phone_number: phone.digits(),
            callback_url: self.config.full_callback_url(),
            account_reference: clip(&request.obligation_id.to_string(), ACCOUNT_REFERENCE_MAX),
            transaction_desc: clip(&request.description, TRANSACTION_DESC_MAX),
        };

        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.url("/mpesa/stkpush/v1/processrequest"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(transport(PROVIDER))?;
        let started: StkPushResponse = read_json(PROVIDER, response).await?;

        if started.response_code != "0" {
            return Err(IntegrationError::Rejected {
                provider: PROVIDER,
                status: 200,
                message: started.response_description,
            });
        }

        Ok(ChargeStarted {
            tracking_id: started.checkout_request_id,
            redirect_url: None,
            message: started.customer_message,
        })
    }

    #[instrument(skip(self))]
    async fn stk_query(&self, checkout_request_id: &str) -> IntegrationResult<Option<GatewayResult>> {
        let timestamp = stk_timestamp(Utc::now());
        let body = StkQueryRequest {
            business_short_code: &self.config.shortcode,
            password: stk_password(&self.config.shortcode, &self.config.passkey, &timestamp),
            timestamp,
            checkout_request_id,
        };

        let token = self.access_token().await?;
        let response = self
            .http
            .post(self.url("/mpesa/stkpushquery/v1/query"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        // In-flight queries come back as HTTP 500 with a JSON error body
        let raw: Value = response
            .json()
            .await
            .map_err(|e| IntegrationError::invalid(PROVIDER, e.to_string()))?;
        let query: StkQueryResponse = serde_json::from_value(raw.clone())
            .map_err(|e| IntegrationError::invalid(PROVIDER, e.to_string()))?;

        Ok(query_result(checkout_request_id, query, raw))
    }
}

fn query_result(checkout_request_id: &str, query: StkQueryResponse, raw: Value) -> Option<GatewayResult> {
    if query.error_code.as_deref() == Some(QUERY_IN_FLIGHT) {
        return None;
    }
    let Some(code) = query.result_code.as_deref().and_then(|c| c.trim().parse::<i64>().ok()) else {
        warn!(
            checkout_request_id,
            error = ?query.error_message,
            "STK query returned no result code"
        );
        return None;
    };

    let mut result = GatewayResult::new(
        PaymentChannel::MpesaStk,
        checkout_request_id,
        GatewayOutcome::from_mpesa_result_code(code),
    );
    result.description = query.result_desc;
    result.raw = raw;
    Some(result)
}

#[async_trait]
impl PaymentGateway for MpesaClient {
    fn channel(&self) -> PaymentChannel {
        PaymentChannel::MpesaStk
    }

    async fn start_charge(&self, request: &ChargeRequest) -> Result<ChargeStarted, DomainError> {
        Ok(self.stk_push(request).await?)
    }

    async fn query_status(&self, tracking_id: &str) -> Result<Option<GatewayResult>, DomainError> {
        Ok(self.stk_query(tracking_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_timestamp_is_east_africa_time() {
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 22, 15, 9).unwrap();
        assert_eq!(stk_timestamp(now), "20260201011509");
    }

    #[test]
    fn test_password() {
        // Daraja sandbox shortcode and passkey
        let password = stk_password(
            "174379",
            "bfb279f9aa9bdbcf158e97dd71a467cd2e0c893059b10f78e6b72ada1ed2c919",
            "20160216165627",
        );
        assert_eq!(
            password,
            "MTc0Mzc5YmZiMjc5ZjlhYTliZGJjZjE1OGU5N2RkNzFhNDY3Y2QyZTBjODkzMDU5YjEwZjc4ZTZiNzJhZGExZWQyYzkxOTIwMTYwMjE2MTY1NjI3"
        );
    }

    #[test]
    fn test_clip_removes_symbols_and_limits_length() {
        assert_eq!(clip("Welfare: Baby Otieno!", TRANSACTION_DESC_MAX), "Welfare Baby ");
        assert_eq!(clip("123456789012345", ACCOUNT_REFERENCE_MAX), "123456789012");
    }

    #[test]
    fn test_push_request_field_names() {
        let body = StkPushRequest {
            business_short_code: "174379",
            password: "pw".to_string(),
            timestamp: "20260101000000".to_string(),
            transaction_type: "CustomerPayBillOnline",
            amount: 1000,
            party_a: "254712345678",
            party_b: "174379",
            phone_number: "254712345678",
            callback_url: "https://portal.example/webhooks/mpesa/tok".to_string(),
            account_reference: "OBL1".to_string(),
            transaction_desc: "Dues".to_string(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["BusinessShortCode"], "174379");
        assert_eq!(value["PartyA"], "254712345678");
        assert_eq!(value["CallBackURL"], "https://portal.example/webhooks/mpesa/tok");
        assert_eq!(value["Amount"], 1000);
    }

    #[test]
    fn test_query_in_flight_is_none() {
        let raw = json!({"requestId":"1","errorCode":"500.001.1001","errorMessage":"The transaction is being processed"});
        let query: StkQueryResponse = serde_json::from_value(raw.clone()).unwrap();
        assert!(query_result("ws_CO_1", query, raw).is_none());
    }

    #[test]
    fn test_query_cancelled() {
        let raw = json!({"ResponseCode":"0","ResultCode":"1032","ResultDesc":"Request cancelled by user"});
        let query: StkQueryResponse = serde_json::from_value(raw.clone()).unwrap();
        let result = query_result("ws_CO_1", query, raw).unwrap();
        assert_eq!(result.outcome, GatewayOutcome::Cancelled);
        assert!(result.amount.is_none());
    }
}
