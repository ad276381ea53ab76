//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

use super::providers::{
    section, CaptchaConfig, EmailConfig, MpesaConfig, PesapalConfig, SmsConfig,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub snowflake: SnowflakeConfig,
    pub portal: PortalConfig,
    /// Optional provider sections; `None` disables the feature
    pub mpesa: Option<MpesaConfig>,
    pub pesapal: Option<PesapalConfig>,
    pub sms: Option<SmsConfig>,
    pub captcha: Option<CaptchaConfig>,
    pub email: Option<EmailConfig>,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Session token settings; tokens are HS256 with a secret shared with the auth provider
#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: i64,
    pub recovery_token_expiry: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("recovery_token_expiry", &self.recovery_token_expiry)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    pub worker_id: u16,
}

/// Portal behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Public URL of the web portal, used in email links
    pub base_url: String,
    /// Seconds between overdue-obligation sweeps; 0 disables the job
    pub sweep_interval_secs: u64,
    /// Country calling code for phone numbers entered in national format
    pub default_country_code: String,
    pub stats_ttl_secs: u64,
}

// Default value functions
fn default_app_name() -> String {
    "cbo-portal".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_access_token_expiry() -> i64 {
    3600 // 1 hour
}

fn default_recovery_token_expiry() -> i64 {
    1800 // 30 minutes
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    50
}

fn default_portal_base_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_country_code() -> String {
    cbo_core::value_objects::DEFAULT_COUNTRY_CODE.to_string()
}

fn default_stats_ttl() -> u64 {
    300
}

/// Non-empty, trimmed value of `key`
fn var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    var(lookup, key).ok_or(ConfigError::MissingVar(key))
}

fn parsed_or<F, T>(lookup: &F, key: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(lookup, key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a required variable is missing, a value does not parse, or a
    /// provider section is only partially configured
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match var(&lookup, "APP_ENV").map(|s| s.to_lowercase()) {
            None => Environment::default(),
            Some(s) => match s.as_str() {
                "production" => Environment::Production,
                "staging" => Environment::Staging,
                "development" => Environment::Development,
                _ => return Err(ConfigError::InvalidValue("APP_ENV", s)),
            },
        };

        Ok(Self {
            app: AppSettings {
                name: var(&lookup, "APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            api: ServerConfig {
                host: var(&lookup, "API_HOST").unwrap_or_else(default_host),
                port: {
                    let raw = required(&lookup, "API_PORT")?;
                    raw.parse()
                        .map_err(|_| ConfigError::InvalidValue("API_PORT", raw))?
                },
            },
            database: DatabaseConfig {
                url: required(&lookup, "DATABASE_URL")?,
                max_connections: parsed_or(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    default_max_connections,
                )?,
                min_connections: parsed_or(
                    &lookup,
                    "DATABASE_MIN_CONNECTIONS",
                    default_min_connections,
                )?,
            },
            redis: RedisConfig {
                url: required(&lookup, "REDIS_URL")?,
                max_connections: parsed_or(
                    &lookup,
                    "REDIS_MAX_CONNECTIONS",
                    default_redis_max_connections,
                )?,
            },
            jwt: JwtConfig {
                secret: required(&lookup, "JWT_SECRET")?,
                access_token_expiry: parsed_or(
                    &lookup,
                    "JWT_ACCESS_TOKEN_EXPIRY",
                    default_access_token_expiry,
                )?,
                recovery_token_expiry: parsed_or(
                    &lookup,
                    "JWT_RECOVERY_TOKEN_EXPIRY",
                    default_recovery_token_expiry,
                )?,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: parsed_or(
                    &lookup,
                    "RATE_LIMIT_REQUESTS_PER_SECOND",
                    default_requests_per_second,
                )?,
                burst: parsed_or(&lookup, "RATE_LIMIT_BURST", default_burst)?,
            },
            cors: CorsConfig {
                allowed_origins: var(&lookup, "CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            snowflake: SnowflakeConfig {
                worker_id: parsed_or(&lookup, "WORKER_ID", || 0)?,
            },
            portal: PortalConfig {
                base_url: var(&lookup, "PORTAL_BASE_URL")
                    .unwrap_or_else(default_portal_base_url)
                    .trim_end_matches('/')
                    .to_string(),
                sweep_interval_secs: parsed_or(
                    &lookup,
                    "SWEEP_INTERVAL_SECS",
                    default_sweep_interval,
                )?,
                default_country_code: var(&lookup, "SMS_DEFAULT_COUNTRY_CODE")
                    .map(|c| c.trim_start_matches('+').to_string())
                    .unwrap_or_else(default_country_code),
                stats_ttl_secs: parsed_or(&lookup, "STATS_CACHE_TTL_SECS", default_stats_ttl)?,
            },
            mpesa: MpesaConfig::from_section(
                section(
                    &lookup,
                    [
                        "MPESA_CONSUMER_KEY",
                        "MPESA_CONSUMER_SECRET",
                        "MPESA_SHORTCODE",
                        "MPESA_PASSKEY",
                        "MPESA_CALLBACK_URL",
                        "MPESA_CALLBACK_TOKEN",
                    ],
                )?,
                var(&lookup, "MPESA_ENVIRONMENT"),
            )?,
            pesapal: PesapalConfig::from_section(
                section(
                    &lookup,
                    [
                        "PESAPAL_CONSUMER_KEY",
                        "PESAPAL_CONSUMER_SECRET",
                        "PESAPAL_IPN_ID",
                        "PESAPAL_CALLBACK_URL",
                    ],
                )?,
                var(&lookup, "PESAPAL_ENVIRONMENT"),
            )?,
            sms: SmsConfig::from_section(
                section(
                    &lookup,
                    ["SMS_ACCOUNT_SID", "SMS_AUTH_TOKEN", "SMS_VERIFY_SERVICE_SID"],
                )?,
                var(&lookup, "SMS_API_URL"),
            ),
            captcha: CaptchaConfig::from_section(
                section(&lookup, ["CAPTCHA_SECRET"])?,
                var(&lookup, "CAPTCHA_VERIFY_URL"),
            ),
            email: EmailConfig::from_section(
                section(&lookup, ["EMAIL_API_KEY", "EMAIL_FROM_ADDRESS"])?,
                var(&lookup, "EMAIL_API_URL"),
            ),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
