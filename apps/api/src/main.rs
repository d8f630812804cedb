use acadash_api::logging::{init_logging, LoggingConfig};
use acadash_api::{app, ApiConfig, AppState};
use acadash_auth::AuthConfig;
use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api_config = ApiConfig::from_env()?;
    init_logging(&LoggingConfig::from_api_config(&api_config))?;

    let auth_config = AuthConfig::from_env()?;
    if api_config.environment.is_production() {
        auth_config.validate_for_production()?;
    }

    let state = AppState::from_config(&auth_config).await?;
    let addr = api_config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(%addr, environment = %api_config.environment, "acadash API listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
