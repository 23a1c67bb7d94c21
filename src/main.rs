//! Marquee Server — cinema seat reservation backend.
//!
//! Main entry point that wires the stores, lock coordinator, cache mirror,
//! and expiration worker together and runs until shutdown. Transport layers
//! (HTTP or otherwise) sit in front of [`ReservationService`] and are out of
//! scope here.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use marquee_cache::CacheManager;
use marquee_core::config::AppConfig;
use marquee_core::error::AppError;
use marquee_core::traits::cache::CacheProvider;
use marquee_database::DatabasePool;
use marquee_database::repositories::{
    JobRepository, JobStore, ReservationRepository, SaleRepository, SeatRepository,
    SessionRepository,
};
use marquee_service::ReservationService;
use marquee_service::reservation::CacheMirror;
use marquee_worker::executor::JobExecutor;
use marquee_worker::jobs::{ExpirationJobHandler, SweepJobHandler};
use marquee_worker::{CronScheduler, ExpirationQueue, WorkerRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("MARQUEE_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Marquee v{}", env!("CARGO_PKG_VERSION"));

    // ── Database ─────────────────────────────────────────────────
    let db = DatabasePool::connect(&config.database).await?;
    db.health_check().await?;
    marquee_database::migration::run_migrations(db.pool()).await?;

    // ── Coordination store ───────────────────────────────────────
    tracing::info!("Initializing cache (provider: {})...", config.cache.provider);
    let cache = CacheManager::new(&config.cache).await?;
    let lock = marquee_cache::provider::lock_coordinator(&config.cache).await?;

    cache.health_check().await?;
    lock.health_check().await?;
    tracing::info!("Coordination store healthy");

    // ── Repositories ─────────────────────────────────────────────
    let session_repo = Arc::new(SessionRepository::new(db.pool().clone()));
    let seat_repo = Arc::new(SeatRepository::new(db.pool().clone()));
    let reservation_repo = Arc::new(ReservationRepository::new(db.pool().clone()));
    let sale_repo = Arc::new(SaleRepository::new(db.pool().clone()));
    let job_store: Arc<dyn JobStore> = Arc::new(JobRepository::new(db.pool().clone()));

    // ── Queue + lifecycle manager ────────────────────────────────
    let queue = Arc::new(ExpirationQueue::new(
        Arc::clone(&job_store),
        config.worker.max_attempts,
    ));

    let service = Arc::new(ReservationService::new(
        session_repo,
        seat_repo,
        reservation_repo,
        sale_repo,
        lock,
        Arc::clone(&queue) as _,
        CacheMirror::new(cache.provider()),
        config.reservation.clone(),
    ));

    // ── Worker + sweep scheduler ─────────────────────────────────
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let mut runner_handle = None;

    if config.worker.enabled {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(ExpirationJobHandler::new(Arc::clone(&service))));
        executor.register(Arc::new(SweepJobHandler::new(Arc::clone(&service))));

        let worker_id = format!("marquee-{}", Uuid::new_v4());
        let runner = WorkerRunner::new(
            Arc::clone(&job_store),
            Arc::new(executor),
            config.worker.clone(),
            worker_id,
        );
        runner_handle = Some(tokio::spawn(async move {
            runner.run(cancel_rx).await;
        }));
    } else {
        tracing::warn!("Worker disabled; reservations will only expire via an external sweep");
    }

    let mut scheduler = CronScheduler::new(Arc::clone(&queue)).await?;
    scheduler.register_default_tasks(&config.worker).await?;
    scheduler.start().await?;

    tracing::info!("Marquee is running; press Ctrl+C to shut down");

    // ── Shutdown ─────────────────────────────────────────────────
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down...");

    let _ = cancel_tx.send(true);
    if let Some(handle) = runner_handle {
        let _ = handle.await;
    }
    scheduler.shutdown().await?;
    db.close().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
