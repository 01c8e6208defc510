//! Merchant Orders Engine — Entry Point
//!
//! Initializes configuration, logging, the authenticated gateway, and
//! the live-sync engine. Runs until SIGINT/SIGTERM.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Load session token from env (MERCHANT_API_TOKEN)
//! 4. Create ApiClient (HTTP + bearer auth + retry)
//! 5. Create HttpOrderGateway (OrderGateway + StoreStatusSource ports)
//! 6. Create OrderSyncEngine + its PollCoordinator (10 s cadence)
//! 7. Create StoreStatusWatcher + its PollCoordinator (120 s cadence)
//! 8. Spawn event logger (notification batches, failures, session expiry)
//! 9. Wait for SIGINT → graceful shutdown (stop pollers → exit)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::api::auth::SessionAuth;
use adapters::api::client::{ApiClient, ApiClientConfig};
use adapters::api::gateway::HttpOrderGateway;
use usecases::engine::{EngineEvent, OrderSyncEngine};
use usecases::poll_coordinator::PollCoordinator;
use usecases::store_status::StoreStatusWatcher;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config =
        config::loader::load_config("config.toml").context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.engine.log_level)
            }),
        )
        .json()
        .init();

    info!(
        name = %config.engine.name,
        version = env!("CARGO_PKG_VERSION"),
        orders_interval = config.polling.orders_interval_secs,
        "Starting merchant orders engine"
    );

    // ── 3. Load session token from env ──────────────────────
    let auth = Arc::new(
        SessionAuth::from_env().context("Failed to load session token from env")?,
    );

    // ── 4. Create authenticated HTTP client ─────────────────
    let api_config = ApiClientConfig {
        base_url: config.api.base_url.clone(),
        timeout: Duration::from_millis(config.api.timeout_ms),
        max_retries: config.api.max_retries,
        retry_base_delay: Duration::from_millis(200),
    };
    let client = Arc::new(
        ApiClient::new(Arc::clone(&auth), api_config)
            .context("Failed to create API client")?,
    );

    // ── 5. Create the gateway (OrderGateway port) ───────────
    let gateway = Arc::new(HttpOrderGateway::new(Arc::clone(&client)));

    // ── 6. Order sync engine + coordinator ──────────────────
    let engine = Arc::new(OrderSyncEngine::new(Arc::clone(&gateway)));
    let orders_poller = PollCoordinator::new(
        Arc::clone(&engine),
        Duration::from_secs(config.polling.orders_interval_secs),
    );

    // ── 7. Store status watcher + coordinator ───────────────
    let status_watcher = Arc::new(StoreStatusWatcher::new(Arc::clone(&gateway)));
    let status_poller = PollCoordinator::new(
        Arc::clone(&status_watcher),
        Duration::from_secs(config.polling.store_status_interval_secs),
    );

    // ── 8. Spawn event logger ───────────────────────────────
    let mut events = engine.subscribe_events();
    let event_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                EngineEvent::NewOrdersArrived { count } => {
                    info!(count, "New orders notification");
                }
                EngineEvent::RefreshFailed { message } => {
                    warn!(message, "Manual refresh failed");
                }
                EngineEvent::SessionExpired => {
                    warn!("Session expired — polling halted until re-auth");
                }
                EngineEvent::ActionSucceeded { order_id, action } => {
                    info!(%order_id, %action, "Order action succeeded");
                }
                EngineEvent::ActionFailed {
                    order_id,
                    action,
                    message,
                } => {
                    warn!(%order_id, %action, message, "Order action failed");
                }
            }
        }
    });

    orders_poller.start();
    status_poller.start();
    info!("Pollers running — engine is live");

    // ── 9. Wait for SIGINT ──────────────────────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    // Stop both pollers before exiting; this also cancels any in-flight
    // background fetch so nothing mutates state during teardown.
    orders_poller.stop();
    status_poller.stop();
    event_task.abort();

    info!("Shutdown complete");
    Ok(())
}
