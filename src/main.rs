use anyhow::Context;
use clap::Parser;
use config_manager::SystemConfig;
use lookup_service::LookupService;
use tracing::{debug, info};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Provider keys usually live in .env
    dotenv::dotenv().ok();

    // Logs go to stderr so replies on stdout stay clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lookup_service=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = SystemConfig::load_from_path(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    info!("Configuration loaded ({} environment)", config.system.environment);
    debug!("Effective configuration: {}", config.to_redacted_json());

    let service = LookupService::from_config(&config).await?;

    let reply = match &cli.cmd {
        Command::Price { chain, address } => service.answer_price(chain, address, cli.markup).await,
        Command::Scan { address } => service.answer_scan(address, cli.markup).await,
        Command::Ticker { symbol } => service.answer_ticker(symbol, cli.markup).await,
    };

    println!("{}", reply);
    Ok(())
}
