use anyhow::Context;
use chessmate::config::{AppConfig, DEFAULT_CONFIG_PATH};
use chessmate::infrastructure::telemetry;
use clap::Parser;
use std::path::PathBuf;

/// Two-player chess sessions over WebSocket.
#[derive(Debug, Parser)]
#[command(name = "chessmate", version, about)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Port to listen on, overriding the configuration.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    telemetry::init(&config.logging.filter);
    config.log();

    chessmate::api::start_server(config)
        .await
        .context("server terminated")
}
