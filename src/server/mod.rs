use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use clap::Args;
use tokio::net::TcpListener;
use tracing::Instrument;

use crate::activity::ActivityFetcher;
use crate::config::{self, ActivityConfig};
use crate::telemetry::{self};
use crate::telemetry::ops::serve::Phase as ServePhase;

pub mod handlers;

/// Shared by every request. The fetcher is stateless, so cloning only bumps refcounts.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: ActivityFetcher,
}

/// live-activity serve
#[derive(Args)]
pub struct ServeCmd {
    /// Address to listen on (overrides ACTIVITY_LISTEN)
    #[arg(long)]
    pub listen: Option<String>,
}

pub async fn run(cfg: ActivityConfig, args: ServeCmd) -> Result<()> {
    let log = telemetry::serve();
    let addr = config::listen_from_env(args.listen)?;
    let root = log.root_span_kv([
        ("listen", addr.to_string()),
        ("handle", format!("{:?}", cfg.handle)),
        ("api_base", cfg.api_base.to_string()),
        ("token", cfg.token.is_some().to_string()),
    ]);

    start(cfg, addr).instrument(root).await
}

async fn start(cfg: ActivityConfig, addr: SocketAddr) -> Result<()> {
    let log = telemetry::serve();
    let state = AppState { fetcher: ActivityFetcher::from_config(&cfg)? };
    let listener = TcpListener::bind(addr)
        .instrument(log.span(&ServePhase::Bind))
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    serve(listener, state).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/activity", get(handlers::get_activity))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let log = telemetry::serve();
    let local: SocketAddr = listener.local_addr()?;
    log.info(format!("🚀 Serving activity on http://{local}/api/activity"));

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let _s = log.span(&ServePhase::Shutdown).entered();
    log.info("🛑 Server stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
