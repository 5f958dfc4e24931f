//! CCCD OCR Server
//!
//! HTTP front end for identity card OCR with admission control in front of
//! the OCR backend.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cccd_ocr_server::config::Config;
use cccd_ocr_server::export::spawn_sweeper;
use cccd_ocr_server::routes;
use cccd_ocr_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "cccd_ocr_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting CCCD OCR Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("OCR endpoint: {}", config.ocr.endpoint);
    tracing::info!(
        "Admission: {} requests per {}s, {} concurrent OCR calls",
        config.admission.request_limit,
        config.admission.window.as_secs(),
        config.admission.max_slots
    );

    let state = AppState::new(config.clone()).context("Failed to initialize application state")?;

    match config.storage.export_ttl {
        Some(ttl) => {
            spawn_sweeper(state.exporter().clone(), ttl);
            tracing::info!("Exports in {} expire after {}s", config.storage.export_dir.display(), ttl.as_secs());
        }
        None => tracing::info!("Export expiry disabled"),
    }

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid SERVER_HOST: {}", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    tracing::info!("CCCD OCR Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
