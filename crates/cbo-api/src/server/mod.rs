//! Server setup and initialization
//!
//! Provides the application builder, the overdue-obligation sweep job and the server runner.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use cbo_cache::{RedisPool, RedisStatsCache};
use cbo_common::{AppConfig, AppError, JwtService};
use cbo_core::SnowflakeGenerator;
use cbo_db::{
    create_pool, run_migrations, DatabaseConfig, PgAuditLogRepository, PgObligationRepository,
    PgPaymentRepository, PgProfileRepository, PgRoleAssignmentRepository,
};
use cbo_integrations::{CaptchaClient, MpesaClient, PesapalClient, ResendMailer, TwilioVerifyClient};
use cbo_service::services::ObligationService;
use cbo_service::{ServiceContext, ServiceContextBuilder};
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::middleware::{apply_middleware, apply_middleware_with_config};
use crate::routes::{create_router, health_routes, webhook_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Result<Router, AppError> {
    let config = state.config();
    let api = apply_middleware_with_config(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    )?;
    let unthrottled = apply_middleware(health_routes().merge(webhook_routes()));

    Ok(api.merge(unthrottled).with_state(state))
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    info!("Connecting to Redis...");
    let redis_pool =
        RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;
    info!("Redis connection established");

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
        config.jwt.recovery_token_expiry,
    ));
    let snowflake_generator = Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id));

    let mut builder = ServiceContextBuilder::new()
        .profile_repo(Arc::new(PgProfileRepository::new(pool.clone())))
        .role_repo(Arc::new(PgRoleAssignmentRepository::new(pool.clone())))
        .obligation_repo(Arc::new(PgObligationRepository::new(pool.clone())))
        .payment_repo(Arc::new(PgPaymentRepository::new(pool.clone())))
        .audit_repo(Arc::new(PgAuditLogRepository::new(pool.clone())))
        .stats_cache(Arc::new(RedisStatsCache::new(redis_pool.clone())))
        .jwt_service(jwt_service)
        .snowflake_generator(snowflake_generator)
        .portal(config.portal.clone());
    builder = with_providers(builder, &config)?;

    let service_context = builder
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config, pool, redis_pool))
}

/// Attach every provider whose configuration section is present
fn with_providers(
    mut builder: ServiceContextBuilder,
    config: &AppConfig,
) -> Result<ServiceContextBuilder, AppError> {
    let integration = |e: cbo_integrations::IntegrationError| AppError::Config(e.to_string());

    match &config.mpesa {
        Some(mpesa) => {
            let client = MpesaClient::new(mpesa.clone()).map_err(integration)?;
            builder = builder.mpesa(Arc::new(client), mpesa.callback_token.clone());
            info!(environment = ?mpesa.environment, "M-Pesa payments enabled");
        }
        None => warn!("M-Pesa not configured; STK push payments disabled"),
    }
    match &config.pesapal {
        Some(pesapal) => {
            let client = PesapalClient::new(pesapal.clone()).map_err(integration)?;
            builder = builder.pesapal(Arc::new(client));
            info!(environment = ?pesapal.environment, "Pesapal payments enabled");
        }
        None => warn!("Pesapal not configured; card payments disabled"),
    }
    match &config.sms {
        Some(sms) => {
            let client = TwilioVerifyClient::new(sms.clone()).map_err(integration)?;
            builder = builder.sms(Arc::new(client));
        }
        None => warn!("SMS verification not configured"),
    }
    match &config.captcha {
        Some(captcha) => {
            let client = CaptchaClient::new(captcha.clone()).map_err(integration)?;
            builder = builder.captcha(Arc::new(client));
        }
        None => warn!("CAPTCHA not configured; account recovery disabled"),
    }
    match &config.email {
        Some(email) => {
            let mailer = ResendMailer::new(email.clone()).map_err(integration)?;
            builder = builder.mailer(Arc::new(mailer));
        }
        None => warn!("Email not configured; recovery and invitations disabled"),
    }

    Ok(builder)
}

/// Periodically mark overdue obligations missed. Returns None when the interval is 0.
pub fn spawn_sweep_job(state: &AppState) -> Option<JoinHandle<()>> {
    let interval_secs = state.config().portal.sweep_interval_secs;
    if interval_secs == 0 {
        info!("Overdue sweep job disabled");
        return None;
    }

    let state = state.clone();
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            run_sweep(state.service_context()).await;
        }
    }))
}

async fn run_sweep(ctx: &ServiceContext) {
    match ObligationService::new(ctx).sweep_overdue(Utc::now()).await {
        Ok(0) => {}
        Ok(count) => info!(count, "Sweep marked obligations missed"),
        Err(e) => error!(error = %e, "Overdue sweep failed"),
    }
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid listen address: {e}")))?;

    let state = create_app_state(config).await?;
    let _sweep = spawn_sweep_job(&state);
    let app = create_app(state)?;

    run_server(app, addr).await
}
