//! Chat-completion proxy binary.
//!
//! Serves `POST /api/chat` and forwards transcripts to the configured
//! provider. The provider credential is read from the environment variable
//! named by `proxy.api_key_env` (default `GROQ_API_KEY`).

use clap::Parser;
use folio::AssistantConfig;
use folio::proxy::ProxyServer;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Folio chat proxy.
#[derive(Parser)]
#[command(name = "folio-proxy", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("folio=info,tower_http=warn")),
        )
        .init();

    let cli = Cli::parse();
    let path = cli
        .config
        .unwrap_or_else(AssistantConfig::default_config_path);
    let mut config = AssistantConfig::load_or_default(&path)?.proxy;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!("folio-proxy starting");

    let server = ProxyServer::start(&config, config.resolve_api_key())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "folio-proxy failed to start");
            anyhow::anyhow!("folio-proxy failed: {e}")
        })?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("received Ctrl+C, shutting down...");
    server.shutdown();

    tracing::info!("folio-proxy shut down cleanly");
    Ok(())
}
