use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use forecast_service::config::Config;
use forecast_service::market::yahoo::YahooClient;
use forecast_service::server::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            config
                .logging
                .level
                .parse()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        }))
        .init();

    let client = YahooClient::new(Duration::from_secs(config.data.request_timeout_secs))
        .context("failed to build market data client")?;
    let state = AppState {
        source: Arc::new(client),
        start_date: config.start_date(),
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, "forecast service listening");
    axum::serve(listener, router(state))
        .await
        .context("server exited with error")?;
    Ok(())
}
