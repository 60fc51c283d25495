use std::net::SocketAddr;

use stockcast_backend::app;
use stockcast_backend::config::AppConfig;
use stockcast_backend::logging::{self, LogOutput, LoggingConfig};
use stockcast_backend::state::AppState;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env("stockcast", LogOutput::Stdout))?;

    let config = AppConfig::from_env()?;
    let port = config.port;
    let state = AppState::from_config(&config)?;
    let app = app::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Stock prediction server running at http://{}/", addr);
    tracing::info!("📊 API endpoints: POST /api/fetch-stock-data, POST /api/predict-stock, GET /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
