//! STK push callback payload
//!
//! ```json
//! {"Body":{"stkCallback":{
//!     "MerchantRequestID":"29115-34620561-1",
//!     "CheckoutRequestID":"ws_CO_191220191020363925",
//!     "ResultCode":0,
//!     "ResultDesc":"The service request is processed successfully.",
//!     "CallbackMetadata":{"Item":[
//!         {"Name":"Amount","Value":1.00},
//!         {"Name":"MpesaReceiptNumber","Value":"NLJ7RT61SV"},
//!         {"Name":"PhoneNumber","Value":254708374149}]}}}}
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use cbo_core::entities::PaymentChannel;
use cbo_core::reconciliation::{GatewayOutcome, GatewayResult};
use cbo_core::value_objects::Money;

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode", deserialize_with = "number_or_string")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<CallbackItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

fn number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Int(i64),
        Str(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Int(code) => Ok(code),
        Code::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl StkCallback {
    fn item(&self, name: &str) -> Option<&Value> {
        self.callback_metadata
            .as_ref()?
            .items
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))?
            .value
            .as_ref()
    }

    /// Paid amount; numbers and numeric strings are both seen in the wild
    pub fn amount(&self) -> Option<Money> {
        match self.item("Amount")? {
            Value::Number(n) => n.as_f64().and_then(Money::from_major),
            Value::String(s) => s.trim().parse::<f64>().ok().and_then(Money::from_major),
            _ => None,
        }
    }

    pub fn receipt_number(&self) -> Option<String> {
        self.item("MpesaReceiptNumber").and_then(value_to_string)
    }

    pub fn phone_number(&self) -> Option<String> {
        self.item("PhoneNumber").and_then(value_to_string)
    }

    pub fn outcome(&self) -> GatewayOutcome {
        GatewayOutcome::from_mpesa_result_code(self.result_code)
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl StkCallbackEnvelope {
    /// Normalize into a [`GatewayResult`], keeping `raw` for the audit trail
    pub fn into_gateway_result(self, raw: Value) -> GatewayResult {
        let cb = self.body.stk_callback;
        let mut result = GatewayResult::new(
            PaymentChannel::MpesaStk,
            cb.checkout_request_id.clone(),
            cb.outcome(),
        );
        result.amount = cb.amount();
        result.receipt = cb.receipt_number();
        result.phone = cb.phone_number();
        result.description = Some(cb.result_desc.clone()).filter(|d| !d.is_empty());
        result.raw = raw;
        result
    }
}

/// Acknowledgement Daraja expects for every callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MpesaAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i32,
    #[serde(rename = "ResultDesc")]
    pub result_desc: &'static str,
}

impl MpesaAck {
    pub const fn accepted() -> Self {
        Self {
            result_code: 0,
            result_desc: "Accepted",
        }
    }
}

impl Default for MpesaAck {
    fn default() -> Self {
        Self::accepted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn success_payload() -> Value {
        json!({"Body":{"stkCallback":{
            "MerchantRequestID":"29115-34620561-1",
            "CheckoutRequestID":"ws_CO_191220191020363925",
            "ResultCode":0,
            "ResultDesc":"The service request is processed successfully.",
            "CallbackMetadata":{"Item":[
                {"Name":"Amount","Value":1000.00},
                {"Name":"MpesaReceiptNumber","Value":"NLJ7RT61SV"},
                {"Name":"Balance"},
                {"Name":"TransactionDate","Value":20191219102115_i64},
                {"Name":"PhoneNumber","Value":254708374149_i64}]}}}})
    }

    #[test]
    fn test_parse_success_callback() {
        let raw = success_payload();
        let envelope: StkCallbackEnvelope = serde_json::from_value(raw.clone()).unwrap();
        let result = envelope.into_gateway_result(raw);

        assert_eq!(result.tracking_id, "ws_CO_191220191020363925");
        assert_eq!(result.outcome, GatewayOutcome::Success);
        assert_eq!(result.amount, Some(Money::from_cents(100_000)));
        assert_eq!(result.receipt.as_deref(), Some("NLJ7RT61SV"));
        assert_eq!(result.phone.as_deref(), Some("254708374149"));
        assert_eq!(result.channel, PaymentChannel::MpesaStk);
    }

    #[test]
    fn test_parse_cancelled_callback_without_metadata() {
        let raw = json!({"Body":{"stkCallback":{
            "MerchantRequestID":"1-2-3",
            "CheckoutRequestID":"ws_CO_1",
            "ResultCode":"1032",
            "ResultDesc":"Request cancelled by user"}}});
        let envelope: StkCallbackEnvelope = serde_json::from_value(raw.clone()).unwrap();
        let result = envelope.into_gateway_result(raw);

        assert_eq!(result.outcome, GatewayOutcome::Cancelled);
        assert!(result.amount.is_none());
        assert!(result.receipt.is_none());
    }

    #[test]
    fn test_result_codes() {
        for (code, outcome) in [
            (0, GatewayOutcome::Success),
            (1032, GatewayOutcome::Cancelled),
            (1037, GatewayOutcome::Timeout),
            (1, GatewayOutcome::Failed),
            (2001, GatewayOutcome::Failed),
        ] {
            let cb = StkCallback {
                merchant_request_id: String::new(),
                checkout_request_id: "ws_CO_1".to_string(),
                result_code: code,
                result_desc: String::new(),
                callback_metadata: None,
            };
            assert_eq!(cb.outcome(), outcome, "code {code}");
        }
    }

    #[test]
    fn test_string_amount() {
        let raw = json!({"Body":{"stkCallback":{
            "CheckoutRequestID":"ws_CO_2",
            "ResultCode":0,
            "CallbackMetadata":{"Item":[{"Name":"Amount","Value":"1500.50"}]}}}});
        let envelope: StkCallbackEnvelope = serde_json::from_value(raw).unwrap();
        assert_eq!(
            envelope.body.stk_callback.amount(),
            Some(Money::from_cents(150_050))
        );
    }

    #[test]
    fn test_ack_shape() {
        let ack = serde_json::to_value(MpesaAck::accepted()).unwrap();
        assert_eq!(ack, json!({"ResultCode":0,"ResultDesc":"Accepted"}));
    }
}
