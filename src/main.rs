//! Peakform backend entry point.
//!
//! Composition root: loads configuration, wires adapters into the domain
//! services, starts the reminder scheduler, and serves the HTTP surface.
//! The scheduler is started here explicitly and stopped on shutdown; it is
//! not an implicit global.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use peakform::adapters::audit::TracingAuditLog;
use peakform::adapters::auth::{MockIdentityProvider, OidcConfig, OidcIdentityProvider};
use peakform::adapters::http::{api_router, AppState};
use peakform::adapters::postgres::{
    PostgresAccountRepository, PostgresProgressLogReader, PostgresPromoCodeRepository,
};
use peakform::adapters::push::{FcmConfig, FcmPushSender};
use peakform::adapters::redis::RedisAccountCache;
use peakform::application::RegisterAccountHandler;
use peakform::config::AppConfig;
use peakform::domain::billing::{AccountLocks, PaymentEventProcessor, PaymentWebhookVerifier};
use peakform::domain::promo::{PromoCodeGenerator, RedemptionCoordinator};
use peakform::domain::reminder::{ReminderJobs, ReminderScheduler};
use peakform::ports::{
    AccountCache, AccountRepository, AuditLog, IdentityProvider, ProgressLogReader,
    PromoCodeRepository, PushSender,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);
    tracing::info!(
        environment = ?config.server.environment,
        addr = %config.server.socket_addr(),
        "starting peakform backend"
    );

    // Storage
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let redis_client = redis::Client::open(config.redis.url.clone())?;
    let redis_conn = redis_client.get_multiplexed_tokio_connection().await?;

    // Adapters
    let accounts: Arc<dyn AccountRepository> =
        Arc::new(PostgresAccountRepository::new(pool.clone()));
    let ledger: Arc<dyn PromoCodeRepository> =
        Arc::new(PostgresPromoCodeRepository::new(pool.clone()));
    let progress: Arc<dyn ProgressLogReader> = Arc::new(PostgresProgressLogReader::new(pool));
    let cache: Arc<dyn AccountCache> = Arc::new(RedisAccountCache::with_ttl(
        redis_conn,
        config.redis.account_ttl(),
    ));
    let audit: Arc<dyn AuditLog> = Arc::new(TracingAuditLog::new());
    let push: Arc<dyn PushSender> = {
        let mut fcm = FcmConfig::new(config.push.server_key.clone())
            .with_timeout(config.push.timeout());
        if let Some(endpoint) = &config.push.endpoint {
            fcm = fcm.with_endpoint(endpoint.clone());
        }
        Arc::new(FcmPushSender::new(fcm)?)
    };
    let identity: Arc<dyn IdentityProvider> = if config.auth.use_mock {
        tracing::warn!("using mock identity provider");
        Arc::new(MockIdentityProvider::new())
    } else {
        Arc::new(OidcIdentityProvider::new(OidcConfig::new(
            config.auth.issuer_url.clone(),
            config.auth.audience.clone(),
        ))?)
    };

    // Domain services. The lock map is shared by every writer of the
    // account subscription sub-record.
    let locks = AccountLocks::new();
    let verifier = Arc::new(PaymentWebhookVerifier::new(
        config.payment.webhook_secret.clone(),
    ));
    let processor = Arc::new(PaymentEventProcessor::new(
        accounts.clone(),
        cache.clone(),
        audit.clone(),
        locks.clone(),
    ));
    let coordinator = Arc::new(RedemptionCoordinator::new(
        ledger.clone(),
        accounts.clone(),
        cache.clone(),
        audit.clone(),
        locks,
    ));
    let generator = Arc::new(PromoCodeGenerator::new(ledger.clone()));
    let register = Arc::new(RegisterAccountHandler::new(
        identity,
        accounts.clone(),
        cache,
        config.account.trial_days,
    ));

    // Reminder scheduler lifecycle
    let scheduler_handle = if config.scheduler.enabled {
        let jobs = Arc::new(ReminderJobs::new(
            accounts,
            progress,
            push,
            config.scheduler.time_zone(),
        ));
        Some(ReminderScheduler::new(jobs, config.scheduler.time_zone()).start())
    } else {
        tracing::info!("reminder scheduler disabled by configuration");
        None
    };

    // HTTP surface
    let state = AppState {
        verifier,
        processor,
        coordinator,
        generator,
        ledger,
        register,
    };
    let app = api_router()
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::timeout::TimeoutLayer::new(
            std::time::Duration::from_secs(config.server.request_timeout_secs),
        ));

    let listener = tokio::net::TcpListener::bind(config.server.socket_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler_handle {
        handle.stop().await;
    }
    tracing::info!("peakform backend stopped");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
}
