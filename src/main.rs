use axum::serve;
use commitment_status::{api, Config, StatusService};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env();

    tracing::info!("Starting commitment status service");

    if config.upstream.database_url.is_some() {
        tracing::info!("DATABASE_URL is set but unused; status is computed from live RPC calls");
    }

    let service = StatusService::from_config(&config)?;

    // Create cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let app = api::router(service);

    // Parse socket address
    let addr: std::net::SocketAddr = config
        .server
        .addr()
        .parse()
        .map_err(|e| eyre::eyre!("Invalid server address '{}': {}", config.server.addr(), e))?;

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "API server starting"
    );
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /                          - Service info");
    tracing::info!("  GET  /health                    - Upstream health check");
    tracing::info!("  GET  /status                    - Commitment status");
    tracing::info!("  GET  /tx/{{txHash}}               - Transaction status");
    tracing::info!("  GET  /metrics                   - Prometheus metrics");

    let listener = TcpListener::bind(addr).await?;

    // Setup graceful shutdown
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal, initiating graceful shutdown");
                shutdown_token.cancel();
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to listen for shutdown signal");
            }
        }
    });

    // Run server with graceful shutdown
    serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            tracing::info!("Shutting down HTTP server");
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
