//! Instant Payment Notification payloads
//!
//! Pesapal sends the same three fields as a query string (GET) or a JSON body (POST). The
//! notification carries no amount or status; it only says "look at this order".
//!
//! Parsing never fails. Missing fields come back empty so the caller can still answer with an
//! acknowledgement and record what arrived.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

const TRACKING_ID: &str = "OrderTrackingId";
const NOTIFICATION_TYPE: &str = "OrderNotificationType";
const MERCHANT_REFERENCE: &str = "OrderMerchantReference";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IpnNotification {
    #[serde(rename = "OrderTrackingId", default)]
    pub order_tracking_id: String,
    #[serde(rename = "OrderNotificationType", default)]
    pub order_notification_type: Option<String>,
    #[serde(rename = "OrderMerchantReference", default)]
    pub order_merchant_reference: Option<String>,
}

impl IpnNotification {
    /// Read the GET form from a raw query string
    pub fn from_query(query: Option<&str>) -> Self {
        Self::from_pairs(query.unwrap_or_default().as_bytes())
    }

    /// Read the POST form. JSON objects are read by key whatever the content type; anything
    /// else is treated as a url-encoded form.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => {
                let field = |key: &str| map.get(key).and_then(scalar);
                Self {
                    order_tracking_id: field(TRACKING_ID).unwrap_or_default(),
                    order_notification_type: field(NOTIFICATION_TYPE),
                    order_merchant_reference: field(MERCHANT_REFERENCE),
                }
            }
            Ok(_) => Self::default(),
            Err(_) => Self::from_pairs(body),
        }
    }

    fn from_pairs(input: &[u8]) -> Self {
        let mut notification = Self::default();
        for (key, value) in form_urlencoded::parse(input) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                TRACKING_ID => notification.order_tracking_id = value.to_string(),
                NOTIFICATION_TYPE => notification.order_notification_type = Some(value.to_string()),
                MERCHANT_REFERENCE => notification.order_merchant_reference = Some(value.to_string()),
                _ => {}
            }
        }
        notification
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Response body Pesapal expects after an IPN
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpnAck {
    pub order_notification_type: String,
    pub order_tracking_id: String,
    pub order_merchant_reference: String,
    /// 200 when processed, 500 to ask Pesapal to notify again later
    pub status: u16,
}

impl IpnAck {
    pub fn new(notification: &IpnNotification, processed: bool) -> Self {
        Self {
            order_notification_type: notification
                .order_notification_type
                .clone()
                .unwrap_or_else(|| "IPNCHANGE".to_string()),
            order_tracking_id: notification.order_tracking_id.clone(),
            order_merchant_reference: notification
                .order_merchant_reference
                .clone()
                .unwrap_or_default(),
            status: if processed { 200 } else { 500 },
        }
    }
}
