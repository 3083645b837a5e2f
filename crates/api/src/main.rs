use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use framegrab_api::config::ServerConfig;
use framegrab_api::router::build_app_router;
use framegrab_api::state::AppState;
use framegrab_core::tool::SystemToolRunner;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "framegrab_api=debug,framegrab_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        storage_dir = %config.storage_dir.display(),
        max_upload_bytes = config.max_upload_bytes,
        "Loaded server configuration"
    );

    // --- Storage ---
    let layout = config.storage_layout();
    layout
        .ensure_dirs()
        .await
        .expect("Failed to create storage directories");
    tracing::info!(
        uploads = %layout.uploads_dir.display(),
        frames = %layout.frames_dir.display(),
        "Storage directories ready"
    );

    // --- App state ---
    let state = AppState::new(config.clone(), Arc::new(SystemToolRunner));

    if let Err(e) = state.processor.ensure_tools().await {
        // Not fatal: uploads report the missing tool per request.
        tracing::warn!(error = %e, "ffmpeg is not available");
    }

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
