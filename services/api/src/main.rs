mod azure;
mod config;
mod error;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;

use crate::azure::AzureClient;
use crate::config::Config;
use crate::routes::AppState;

/// Backend for the avatar chat client: speech relay tokens and chat answers.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Address to listen on. Overrides BIND_ADDRESS.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load application configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let args = Cli::parse();
    let addr = args.bind.unwrap_or(config.bind_address);

    if config.speech.key.is_none() {
        warn!("AZURE_SPEECH_KEY is not set, /avatar/token will fail");
    }
    if config.openai.is_none() {
        warn!("Azure OpenAI is not fully configured, /ask will fail");
    }

    let app = routes::router(AppState::new(config, Arc::new(AzureClient::new())));

    info!("Starting avatar backend, listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
