//! `dashgate` server entry point.
//!
//! Loads configuration, builds the shared state and router, then serves
//! until SIGINT or SIGTERM.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use dashgate_server::config::ServerConfig;
use dashgate_server::routes;
use dashgate_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    let bind_addr = config.bind_addr;
    let state = AppState::new(config);

    info!(
        dashboard_dir = %state.config.dashboard_dir.display(),
        tasks_dir = %state.resolver.tasks_root().display(),
        docs_root = %state.config.docs_root.display(),
        documents = state.resolver.documents().len(),
        users = state.config.usernames.len(),
        "dashgate starting"
    );

    let app = routes::build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;

    info!(addr = %bind_addr, "dashgate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("dashgate stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
