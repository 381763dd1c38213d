use clap::Parser;
use metrics_grid::client;
use metrics_grid::config::{Cli, Command};
use metrics_grid::server::ServerNode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown requested");
                    shutdown.cancel();
                }
                Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
            }
        });
    }

    match cli.command {
        Command::Server(config) => {
            let node = ServerNode::start(config, shutdown).await?;
            node.wait().await
        }
        Command::Client(config) => client::run(config, shutdown).await,
    }
}
