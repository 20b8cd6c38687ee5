//! Liquidity bot runner - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Tiered liquidity bots
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LQBOT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    lqbot_telemetry::init_logging()?;

    info!("Starting lqbot v{}", env!("CARGO_PKG_VERSION"));

    let config_path = lqbot_bot::AppConfig::resolve_path(args.config);
    info!(config_path = %config_path, "Loading configuration");

    let config = lqbot_bot::AppConfig::from_file(&config_path)?;
    config.validate()?;
    info!(
        server_url = %config.server_url,
        bots = config.bots.len(),
        tick_interval_ms = config.tick_interval_ms,
        "Configuration loaded"
    );

    let app = lqbot_bot::Application::new(config)?;
    app.connect().await?;
    app.run().await?;

    Ok(())
}
