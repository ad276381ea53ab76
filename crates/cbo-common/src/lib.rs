//! # cbo-common
//!
//! Shared utilities including configuration, error handling, session tokens, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{Claims, JwtService, TokenType};
pub use config::{
    AppConfig, AppSettings, CaptchaConfig, ConfigError, CorsConfig, DatabaseConfig, EmailConfig,
    Environment, GatewayEnvironment, JwtConfig, MpesaConfig, PesapalConfig, PortalConfig,
    RateLimitConfig, RedisConfig, ServerConfig, SmsConfig, SnowflakeConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
