mod cli;

use agency_gateway::{fallback, proxy, Gateway, GatewayConfig, RelayState};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = GatewayConfig::load(cli.config.as_deref())?;
    init_tracing(&config.log_level);

    match cli.command {
        Commands::Serve { listen } => {
            let addr = listen.unwrap_or(config.listen);
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding proxy relay to {addr}"))?;
            proxy::serve(listener, RelayState::from_config(&config)?).await
        }
        Commands::Fetch { collection, slug } => {
            let gateway = Gateway::from_config(&config)?;
            let value = match slug {
                Some(slug) => serde_json::to_value(gateway.fetch_by_slug(collection, &slug).await)?,
                None => gateway.fetch_collection(collection).await,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Commands::Fallback { collection } => {
            println!("{}", serde_json::to_string_pretty(&fallback::fallback_set(collection))?);
            Ok(())
        }
    }
}

// Logs go to stderr so `fetch` output stays pipeable.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
