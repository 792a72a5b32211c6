//! Gatewatch binary: parses CLI/env config, initializes tracing, and spawns
//! the ingest pipeline, expiry/archiver, and HTTP/WebSocket server. Grounded
//! on the teacher's `bin/fleet_hub.rs` wiring order (config → pool →
//! background tasks → router → `axum::serve(...).with_graceful_shutdown`).

use clap::Parser;
use gatewatch::aggregate::{self, AggregateState};
use gatewatch::config::{self, Settings};
use gatewatch::enrich::{FakePinpointService, FakeShipCatalog, FakeSystemResolver, HttpPinpointService, HttpShipCatalog};
use gatewatch::feed::{FeedSource, LongPollFeedSource};
use gatewatch::hub::{self, HubState};
use gatewatch::store::ActivityStore;
use gatewatch::{engine, expiry};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "gatewatch", about = "Real-time killmail stream classification")]
struct CliArgs {
    /// Path to a TOML settings file (overrides GATEWATCH_CONFIG/gatewatch.toml).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// HTTP/WebSocket bind port (overrides settings and PORT).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,gatewatch=debug")),
        )
        .init();

    let args = CliArgs::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::load(),
    };
    if let Some(port) = args.port {
        settings.port = port;
    }
    settings.validate()?;
    config::init(settings.clone());

    info!(port = settings.port, feed_url = %settings.feed_url, "starting gatewatch");

    let archive_pool = connect_archive(&settings).await;

    let store = ActivityStore::new();
    let (updates, _rx) = broadcast::channel(16);
    let shutdown = CancellationToken::new();

    let feed: Box<dyn FeedSource> = Box::new(LongPollFeedSource::new(
        settings.feed_url.clone(),
        Duration::from_secs(settings.feed_poll_timeout_secs),
        Duration::from_secs(settings.feed_backoff_ceiling_secs),
    ));
    let (pinpoint, ships, systems) = enrichment_services(&settings);

    let pipeline_task = tokio::spawn(engine::run_pipeline(
        feed,
        pinpoint,
        ships,
        systems,
        store.clone(),
        settings.clone(),
        updates.clone(),
        shutdown.clone(),
    ));

    let expiry_task = tokio::spawn(expiry::run(
        store.clone(),
        settings.clone(),
        archive_pool.clone(),
        updates.clone(),
        shutdown.clone(),
    ));

    let hub_state = Arc::new(HubState::new(store.clone(), updates.clone(), settings.ping_interval_secs));
    let aggregate_state = Arc::new(AggregateState {
        store: store.clone(),
        archive_pool: archive_pool.clone(),
    });

    let app = hub::router(hub_state).merge(aggregate::router(aggregate_state));
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gatewatch listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            server_shutdown.cancel();
        })
        .await?;

    pipeline_task.abort();
    expiry_task.abort();
    info!("gatewatch shut down gracefully");
    Ok(())
}

/// HTTP-backed enrichment services in production; in-memory fakes have no
/// production code path (tests construct them directly).
fn enrichment_services(
    settings: &Settings,
) -> (
    Arc<dyn gatewatch::enrich::PinpointService>,
    Arc<dyn gatewatch::enrich::ShipCatalog>,
    Arc<dyn gatewatch::enrich::SystemResolver>,
) {
    let timeout = Duration::from_millis(settings.enrich_timeout_ms);
    let pinpoint_url = std::env::var("PINPOINT_URL").unwrap_or_default();
    let ships_url = std::env::var("SHIP_CATALOG_URL").unwrap_or_default();

    let pinpoint: Arc<dyn gatewatch::enrich::PinpointService> = if pinpoint_url.is_empty() {
        warn!("PINPOINT_URL not set, pinpoint/triangulation enrichment is disabled");
        Arc::new(FakePinpointService::default())
    } else {
        Arc::new(HttpPinpointService::new(pinpoint_url, timeout))
    };

    let ships: Arc<dyn gatewatch::enrich::ShipCatalog> = if ships_url.is_empty() {
        warn!("SHIP_CATALOG_URL not set, ship-category enrichment is disabled");
        Arc::new(FakeShipCatalog::default())
    } else {
        Arc::new(HttpShipCatalog::new(ships_url, timeout))
    };

    // System/region naming rides along with the pinpoint response or is
    // left blank; there is no separate upstream endpoint for it.
    let systems: Arc<dyn gatewatch::enrich::SystemResolver> = Arc::new(FakeSystemResolver::default());

    (pinpoint, ships, systems)
}

async fn connect_archive(settings: &Settings) -> Option<PgPool> {
    if settings.archive_dsn.is_empty() {
        warn!("ARCHIVE_DSN not set, expired sessions will not be archived");
        return None;
    }

    match PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&settings.archive_dsn)
        .await
    {
        Ok(pool) => {
            info!("connected to archive database");
            Some(pool)
        }
        Err(e) => {
            warn!(error = %e, "failed to connect to archive database, archiving disabled");
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
