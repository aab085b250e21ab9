//! Feedbus command line client
//!
//! Publishes, subscribes and listens for notifications against a feed bus
//! broker. Received messages are printed to stdout as JSON lines; logs go to
//! stderr and are filtered with `RUST_LOG`.

use anyhow::Result;
use clap::Parser;
use feedbus_cli::cli::{Cli, Command};
use feedbus_cli::commands;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.client_config()?;

    info!("Starting feedbus client");

    let result = match &cli.command {
        Command::Publish { feed, topic, value, image } => {
            commands::publish(&config, feed, topic, value, *image).await
        }
        Command::Subscribe { feed, topics } => commands::subscribe(&config, feed, topics).await,
        Command::Notify { feed } => commands::notify(&config, feed).await,
        Command::Interactive => commands::interactive(&config).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
