use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatrelay::{api, broadcast, config::ServerConfig, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatrelay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(ServerConfig::from_env()).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<(), api::ServerError> {
    let (state, engine) = AppState::new(&config);
    let state = Arc::new(state);
    let engine_handle = broadcast::spawn_engine(engine);

    let app = api::router(state.clone(), &config.index_html());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| api::ServerError::Bind { addr, source })?;
    tracing::info!("listening on *:{}", addr.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Teardown: close remaining sessions, then let the engine drain and stop
    state.shutdown().await;
    drop(state);
    match tokio::time::timeout(Duration::from_secs(5), engine_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Broadcast engine task failed: {}", e),
        Err(_) => tracing::warn!("Broadcast engine did not stop in time"),
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
