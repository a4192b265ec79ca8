//! Branch filter relay server
//!
//! # Environment Variables
//!
//! - `GIT_PROVIDER`: github, gitlab, bitbucket, bitbucket-server, gitea or gogs (default: github)
//! - `GIT_URL`: Provider endpoint for self-hosted installations
//! - `ALLOWED_BRANCHES`: Colon-delimited allowed target branches (required)
//! - `PORT`: Port to listen on (default: 8080)
//! - `BIND_ADDRESS`: Host to bind to (default: 0.0.0.0)
//! - `WEBHOOK_PATH`: Webhook path (default: /)
//! - `MAX_BODY_BYTES`: Largest accepted body (default: 25 MiB)
//! - `LOG_FORMAT`: json or text (default: json)
//! - `RUST_LOG`: Log level (default: info)

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use branch_filter_api::{AppState, LogFormat, RelayConfig, RelayServer, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::from_env().context("Invalid relay configuration")?;

    init_tracing(config.log_format);

    let state = AppState::from_config(&config).context("Failed to initialize branch filter")?;

    tracing::info!("Starting branch filter");
    tracing::info!("Provider: {}", state.client.provider());
    tracing::info!("Allowed branches: {}", state.allow_list);
    if let Some(endpoint) = state.client.endpoint() {
        tracing::info!("Provider endpoint: {}", endpoint);
    }

    let server = RelayServer::new(ServerConfig::from(&config), state);

    // Start server with graceful shutdown
    server.serve().await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
