//! FLEETWATCH - Fleet Operational Intelligence
//!
//! Real-time fleet telemetry, anomaly detection, risk scoring, and
//! snapshot broadcast for logistics dashboards.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (7 trucks, 2 s ticks, port 8080)
//! cargo run --release
//!
//! # Reproducible run with a fixed seed and faster ticks
//! cargo run --release -- --seed 42 --tick-secs 2 --trucks 5
//! ```
//!
//! # Environment Variables
//!
//! - `FLEETWATCH_CONFIG`: Path to a fleetwatch.toml config file
//! - `FLEETWATCH_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `FLEETWATCH_AI_KEY`: API key for the AI collaborator (name
//!   configurable via `assistant.api_key_env`)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use fleetwatch::api::{create_app, DashboardState};
use fleetwatch::config::{self, FleetConfig};
use fleetwatch::engine::{Engine, TickDriver};
use fleetwatch::hub::BroadcastHub;
use fleetwatch::types::DashboardSnapshot;
use fleetwatch::FleetAssistant;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fleetwatch")]
#[command(about = "FLEETWATCH Fleet Operational Intelligence System")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the tick interval in seconds
    #[arg(long)]
    tick_secs: Option<u64>,

    /// Override the fleet size
    #[arg(long)]
    trucks: Option<usize>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Path to a TOML config file (equivalent to FLEETWATCH_CONFIG)
    #[arg(long)]
    config: Option<String>,
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    TickDriver,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::TickDriver => write!(f, "TickDriver"),
        }
    }
}

// ============================================================================
// Task Spawns
// ============================================================================

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Spawn the tick driver task into the JoinSet.
fn spawn_tick_driver(
    task_set: &mut JoinSet<Result<TaskName>>,
    driver: TickDriver,
) {
    task_set.spawn(async move {
        driver.run().await?;
        Ok(TaskName::TickDriver)
    });
}

// ============================================================================
// Supervisor
// ============================================================================

/// Monitor tasks; a task erroring out cancels everything. A corrupted tick
/// loop must stop the service rather than broadcast inconsistent snapshots.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("🔒 Supervisor: All tasks spawned, monitoring...");

    let mut failure: Option<anyhow::Error> = None;
    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(task_name)) => {
                info!("🔒 Supervisor: Task {} completed normally", task_name);
            }
            Ok(Err(e)) => {
                error!("🔒 Supervisor: Task failed: {:#}", e);
                failure.get_or_insert(e);
                cancel_token.cancel();
            }
            Err(e) => {
                error!("🔒 Supervisor: Task panicked: {}", e);
                failure.get_or_insert_with(|| anyhow::anyhow!("task panicked: {}", e));
                cancel_token.cancel();
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    if let Some(ref path) = args.config {
        // The loader reads FLEETWATCH_CONFIG; the flag is a convenience
        std::env::set_var("FLEETWATCH_CONFIG", path);
    }

    let mut cfg = FleetConfig::load();
    if let Some(addr) = args.addr {
        cfg.server.addr = addr;
    }
    if let Some(tick_secs) = args.tick_secs {
        cfg.stream.tick_interval_secs = tick_secs;
    }
    if let Some(trucks) = args.trucks {
        cfg.stream.fleet_size = trucks;
    }
    if let Some(seed) = args.seed {
        cfg.stream.seed = Some(seed);
    }
    cfg.validate().context("Invalid fleet configuration")?;
    config::init(cfg.clone());

    info!("🚚 FLEETWATCH starting");
    info!(
        fleet_size = cfg.stream.fleet_size,
        tick_secs = cfg.stream.tick_interval_secs,
        "Stream configuration"
    );

    // Shared infrastructure: hub, published dashboard view, assistant
    let hub = BroadcastHub::new();
    let dashboard = Arc::new(RwLock::new(DashboardSnapshot::default()));
    let assistant = FleetAssistant::from_config(&cfg.assistant, Arc::clone(&dashboard));

    // Engine owns the hot state exclusively
    let engine = Engine::new(&cfg);

    let cancel_token = CancellationToken::new();
    let driver = TickDriver::new(
        engine,
        hub.clone(),
        Arc::clone(&dashboard),
        cancel_token.clone(),
    );

    info!("🌐 Starting HTTP server on {}...", cfg.server.addr);
    let state = DashboardState::new(dashboard, hub, assistant);
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", cfg.server.addr))?;
    info!("✓ HTTP server listening on {}", cfg.server.addr);
    info!("🎯 Dashboard feed available at: ws://{}/ws", cfg.server.addr);

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());
    spawn_tick_driver(&mut task_set, driver);

    // Ctrl-C triggers the same graceful cancellation path
    {
        let cancel_token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("🛑 Ctrl-C received — shutting down");
                cancel_token.cancel();
            }
        });
    }

    run_supervisor(&mut task_set, cancel_token).await
}
