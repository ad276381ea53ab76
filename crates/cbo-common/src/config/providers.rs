//! Optional provider sections
//!
//! A section is enabled only when every one of its required keys is set. When none are set the
//! feature is disabled; when only some are set loading fails and names the first missing key.

use serde::Deserialize;
use std::fmt;

use super::ConfigError;

/// All of `keys`, none of them, or an error naming the first missing one
pub(crate) fn section<F, const N: usize>(
    lookup: &F,
    keys: [&'static str; N],
) -> Result<Option<[String; N]>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let values = keys.map(|key| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    });
    if values.iter().all(Option::is_none) {
        return Ok(None);
    }
    if let Some(missing) = values.iter().position(Option::is_none) {
        return Err(ConfigError::MissingVar(keys[missing]));
    }
    Ok(Some(values.map(Option::unwrap_or_default)))
}

/// Sandbox or live credentials for a payment gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl GatewayEnvironment {
    fn parse(key: &'static str, raw: Option<String>) -> Result<Self, ConfigError> {
        match raw.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("sandbox") => Ok(Self::Sandbox),
            Some("production" | "live") => Ok(Self::Production),
            Some(other) => Err(ConfigError::InvalidValue(key, other.to_string())),
        }
    }
}

// ============================================================================
// M-Pesa (Daraja)
// ============================================================================

#[derive(Clone)]
pub struct MpesaConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub shortcode: String,
    pub passkey: String,
    /// Public URL of the callback route, without the token segment
    pub callback_url: String,
    /// Secret path segment the callback must carry
    pub callback_token: String,
    pub environment: GatewayEnvironment,
}

impl MpesaConfig {
    pub(crate) fn from_section(
        values: Option<[String; 6]>,
        environment: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some([consumer_key, consumer_secret, shortcode, passkey, callback_url, callback_token]) =
            values
        else {
            return Ok(None);
        };
        Ok(Some(Self {
            consumer_key,
            consumer_secret,
            shortcode,
            passkey,
            callback_url: callback_url.trim_end_matches('/').to_string(),
            callback_token,
            environment: GatewayEnvironment::parse("MPESA_ENVIRONMENT", environment)?,
        }))
    }

    #[must_use]
    pub fn base_url(&self) -> &'static str {
        match self.environment {
            GatewayEnvironment::Sandbox => "https://sandbox.safaricom.co.ke",
            GatewayEnvironment::Production => "https://api.safaricom.co.ke",
        }
    }

    /// Callback URL handed to Daraja, token segment included
    #[must_use]
    pub fn full_callback_url(&self) -> String {
        format!("{}/{}", self.callback_url, self.callback_token)
    }
}

impl fmt::Debug for MpesaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpesaConfig")
            .field("shortcode", &self.shortcode)
            .field("callback_url", &self.callback_url)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Pesapal
// ============================================================================

#[derive(Clone)]
pub struct PesapalConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Registered IPN id the gateway notifies
    pub ipn_id: String,
    /// Where Pesapal sends the payer's browser after checkout
    pub callback_url: String,
    pub environment: GatewayEnvironment,
}

impl PesapalConfig {
    pub(crate) fn from_section(
        values: Option<[String; 4]>,
        environment: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some([consumer_key, consumer_secret, ipn_id, callback_url]) = values else {
            return Ok(None);
        };
        Ok(Some(Self {
            consumer_key,
            consumer_secret,
            ipn_id,
            callback_url,
            environment: GatewayEnvironment::parse("PESAPAL_ENVIRONMENT", environment)?,
        }))
    }

    #[must_use]
    pub fn base_url(&self) -> &'static str {
        match self.environment {
            GatewayEnvironment::Sandbox => "https://cybqa.pesapal.com/pesapalv3",
            GatewayEnvironment::Production => "https://pay.pesapal.com/v3",
        }
    }
}

impl fmt::Debug for PesapalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PesapalConfig")
            .field("ipn_id", &self.ipn_id)
            .field("callback_url", &self.callback_url)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SMS verification (Twilio Verify)
// ============================================================================

#[derive(Clone)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub verify_service_sid: String,
    pub api_url: String,
}

impl SmsConfig {
    pub(crate) fn from_section(values: Option<[String; 3]>, api_url: Option<String>) -> Option<Self> {
        let [account_sid, auth_token, verify_service_sid] = values?;
        Some(Self {
            account_sid,
            auth_token,
            verify_service_sid,
            api_url: api_url.unwrap_or_else(|| "https://verify.twilio.com/v2".to_string()),
        })
    }
}

impl fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsConfig")
            .field("account_sid", &self.account_sid)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// CAPTCHA
// ============================================================================

#[derive(Clone)]
pub struct CaptchaConfig {
    pub secret: String,
    /// hCaptcha-compatible `siteverify` endpoint
    pub verify_url: String,
}

impl CaptchaConfig {
    pub(crate) fn from_section(values: Option<[String; 1]>, verify_url: Option<String>) -> Option<Self> {
        let [secret] = values?;
        Some(Self {
            secret,
            verify_url: verify_url
                .unwrap_or_else(|| "https://api.hcaptcha.com/siteverify".to_string()),
        })
    }
}

impl fmt::Debug for CaptchaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptchaConfig")
            .field("verify_url", &self.verify_url)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Email
// ============================================================================

#[derive(Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub from_address: String,
    pub api_url: String,
}

impl EmailConfig {
    pub(crate) fn from_section(values: Option<[String; 2]>, api_url: Option<String>) -> Option<Self> {
        let [api_key, from_address] = values?;
        Some(Self {
            api_key,
            from_address,
            api_url: api_url.unwrap_or_else(|| "https://api.resend.com/emails".to_string()),
        })
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("from_address", &self.from_address)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_all_or_nothing() {
        let none = |_: &str| None;
        assert!(section(&none, ["A", "B"]).unwrap().is_none());

        let all = |k: &str| Some(format!("v-{k}"));
        assert_eq!(
            section(&all, ["A", "B"]).unwrap(),
            Some(["v-A".to_string(), "v-B".to_string()])
        );

        let half = |k: &str| (k == "A").then(|| "x".to_string());
        assert!(matches!(
            section(&half, ["A", "B"]),
            Err(ConfigError::MissingVar("B"))
        ));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let blank = |k: &str| Some(if k == "A" { "  " } else { "x" }.to_string());
        assert!(matches!(
            section(&blank, ["A", "B"]),
            Err(ConfigError::MissingVar("A"))
        ));
    }

    #[test]
    fn test_mpesa_environment_and_callback() {
        let values = [
            "key", "secret", "174379", "passkey", "https://portal.example/webhooks/mpesa/", "tok",
        ]
        .map(String::from);
        let config = MpesaConfig::from_section(Some(values.clone()), None)
            .unwrap()
            .unwrap();
        assert_eq!(config.base_url(), "https://sandbox.safaricom.co.ke");
        assert_eq!(
            config.full_callback_url(),
            "https://portal.example/webhooks/mpesa/tok"
        );

        let live = MpesaConfig::from_section(Some(values.clone()), Some("production".into()))
            .unwrap()
            .unwrap();
        assert_eq!(live.base_url(), "https://api.safaricom.co.ke");

        assert!(MpesaConfig::from_section(Some(values), Some("moon".into())).is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = CaptchaConfig::from_section(Some(["s3cr3t".to_string()]), None).unwrap();
        assert!(!format!("{config:?}").contains("s3cr3t"));
    }
}
