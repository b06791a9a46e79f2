//! Dashboard Intelligence server
//!
//! Tracks dashboard errors and metrics, asks the analysis service for
//! recovery recommendations and streams the resulting healing events.
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in defaults (or ./dashboard_intel.toml if present)
//! cargo run --release
//!
//! # Point at a specific config and analysis endpoint
//! ./dashboard-intelligence --config prod.toml --analysis-url https://example.test/analyze
//! ```
//!
//! # Environment Variables
//!
//! - `DASHBOARD_INTEL_CONFIG`: Path to the TOML config file
//! - `DASHBOARD_INTEL_ANALYSIS_URL`: Analysis service endpoint
//! - `DASHBOARD_INTEL_API_KEY`: Key sent to the analysis service
//! - `DASHBOARD_INTEL_SERVER_ADDR`: HTTP listen address
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use dashboard_intelligence::api::create_app;
use dashboard_intelligence::{DashboardIntelligence, IntelConfig};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "dashboard-intelligence")]
#[command(about = "Self-healing intelligence layer for analytics dashboards")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides the default search order)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the server address (default: "0.0.0.0:8090")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the analysis service URL
    #[arg(long, value_name = "URL")]
    analysis_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

// ============================================================================
// Task Supervision
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    AnalysisLoop,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::AnalysisLoop => write!(f, "AnalysisLoop"),
        }
    }
}

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

/// Spawn the periodic/triggered analysis loop into the JoinSet.
fn spawn_analysis_loop(
    task_set: &mut JoinSet<Result<TaskName>>,
    intel: &DashboardIntelligence,
    started: Instant,
    cancel_token: CancellationToken,
) {
    let handle = intel.start(started, cancel_token);
    task_set.spawn(async move {
        let requests = handle.await.context("analysis loop panicked")?;
        info!(requests, "[AnalysisLoop] Stopped");
        Ok(TaskName::AnalysisLoop)
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Let in-flight requests and the analysis loop wind down.
    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(task_name)) => info!("Supervisor: task {} stopped", task_name),
            Ok(Err(e)) => error!("Supervisor: task failed during shutdown: {}", e),
            Err(e) => error!("Supervisor: task panicked during shutdown: {}", e),
        }
    }

    Ok(())
}

// ============================================================================
// Startup
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Resolve configuration: file (explicit or searched), then environment,
/// then command-line flags.
fn resolve_config(args: &CliArgs) -> Result<IntelConfig> {
    let mut config = match &args.config {
        Some(path) => IntelConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => IntelConfig::load(),
    };

    config.apply_env_overrides();
    if let Some(addr) = &args.addr {
        config.server.addr = addr.clone();
    }
    if let Some(url) = &args.analysis_url {
        config.analysis.url = url.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let started = Instant::now();
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let config = resolve_config(&args)?;
    let server_addr = config.server.addr.clone();

    info!("Dashboard Intelligence v{}", env!("CARGO_PKG_VERSION"));
    info!(
        url = %config.analysis.url,
        interval_secs = config.analysis.health_check_interval_secs,
        authenticated = config.analysis.api_key().is_some(),
        "Analysis service"
    );

    let intel = DashboardIntelligence::new(config).context("Failed to build analysis client")?;
    let app = create_app(intel.clone());

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_addr))?;
    info!("HTTP server listening on {}", server_addr);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());
    spawn_analysis_loop(&mut task_set, &intel, started, cancel_token.clone());

    run_supervisor(&mut task_set, cancel_token).await
}
