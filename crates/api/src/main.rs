use anyhow::Context;
use api::{create_router_with_timeout, logging::init_tracing, AppState};
use services::subscription::{SubscriptionService, SubscriptionServiceImpl};
use std::{sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
        eprintln!("Continuing with environment variables...");
    }

    let config = config::Config::from_env().context("Invalid configuration")?;

    init_tracing(&config.logging);

    tracing::info!(environment = %config.environment, "Starting subscriptions API...");
    tracing::info!(
        "Database: {}:{}/{}",
        config.database.host,
        config.database.port,
        config.database.database
    );

    tracing::info!("Connecting to database...");
    let db = database::Database::from_config(&config.database).await?;

    let subscription_repo = db.subscription_repository();
    let subscription_service: Arc<dyn SubscriptionService> =
        Arc::new(SubscriptionServiceImpl::new(subscription_repo));

    let app_state = AppState {
        subscription_service,
    };

    let app = create_router_with_timeout(
        app_state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = &config.server.address;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received, draining in-flight requests");
}
