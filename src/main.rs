//! Chat Relay Server
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::oneshot;
use tracing_subscriber::{EnvFilter, fmt};

use chat_api::state::AppState;
use chat_core::config::AppConfig;
use chat_core::config::logging::LogFormat;
use chat_database::Stores;
use chat_realtime::RealtimeEngine;

#[tokio::main]
async fn main() {
    let env = std::env::var("CHAT_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting chat relay v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Message store ────────────────────────────────────
    tracing::info!(provider = ?config.database.provider, "Opening message store...");
    let stores = Stores::from_config(&config.database)
        .await
        .context("Message store initialization failed")?;
    tracing::info!("Message store ready");

    // ── Step 2: Application state ────────────────────────────────
    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .context("Invalid server address")?;
    let grace = config.server.shutdown_grace();
    let state = AppState::build(config, stores.clone());
    let realtime = Arc::clone(&state.realtime);

    // ── Step 3: Build router ─────────────────────────────────────
    let app = chat_api::build_app(state);

    // ── Step 4: Start HTTP server ────────────────────────────────
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Chat relay listening on {}", addr);

    let (signal_tx, signal_rx) = oneshot::channel();
    let shutdown = shutdown_on_signal(Arc::clone(&realtime), signal_tx);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    });

    // ── Step 5: Graceful shutdown ────────────────────────────────
    tokio::select! {
        result = &mut server => {
            result.context("Server task panicked")?.context("Server failed")?;
        }
        _ = signal_rx => {
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => {
                    result.context("Server task panicked")?.context("Server failed")?;
                }
                Err(_) => {
                    tracing::warn!(grace_seconds = grace.as_secs(), "Graceful shutdown timed out");
                    server.abort();
                }
            }
        }
    }

    stores.close().await;
    tracing::info!("Chat relay stopped");
    Ok(())
}

/// Resolves once a shutdown signal arrives, after closing every relay
/// connection.
async fn shutdown_on_signal(realtime: Arc<RealtimeEngine>, notify: oneshot::Sender<()>) {
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, closing relay connections...");
    realtime.shutdown();
    let _ = notify.send(());
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
