//! Configuration structs

mod app_config;
mod providers;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, DatabaseConfig, Environment, JwtConfig,
    PortalConfig, RateLimitConfig, RedisConfig, ServerConfig, SnowflakeConfig,
};
pub use providers::{
    CaptchaConfig, EmailConfig, GatewayEnvironment, MpesaConfig, PesapalConfig, SmsConfig,
};
