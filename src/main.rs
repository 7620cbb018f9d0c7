use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visual_novel_api::models::Config;
use visual_novel_api::server::{self, AppState};
use visual_novel_api::story::StoryService;

#[derive(Debug, Parser)]
#[command(name = "visual-novel-api")]
#[command(about = "Serve AI-generated visual novel story segments")]
struct CliArgs {
    /// Address to listen on (overrides BIND_ADDR).
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visual_novel_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting visual-novel-api");

    let args = CliArgs::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    let story = StoryService::from_config(&config).context("Failed to build AI clients")?;

    let addr = args.bind.unwrap_or(config.bind_addr);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    server::serve(listener, AppState::new(story), shutdown_signal()).await?;

    info!("Server stopped");
    Ok(())
}
