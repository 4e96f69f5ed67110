use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use podvault::archive::Archiver;
use podvault::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "podvault",
    version,
    about = "Download podcast feed enclosures into ./<feed title>/<item>/"
)]
struct Args {
    /// Feed URLs to archive, processed in order
    #[arg(required = true, value_name = "FEED_URL")]
    feeds: Vec<String>,

    /// Cap on the throughput of each download (overrides the config file)
    #[arg(long, value_name = "BYTES")]
    max_bytes_per_second: Option<u64>,

    /// Config file to read instead of ~/.config/podvault/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match args.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    let config = config
        .with_overrides(args.max_bytes_per_second)
        .context("Invalid --max-bytes-per-second")?;

    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    tracing::debug!(
        feeds = args.feeds.len(),
        max_bytes_per_second = config.max_bytes_per_second,
        "Starting archive run"
    );

    // Per-feed and per-item failures are logged, never turned into an exit code
    Archiver::new(client, config.max_bytes_per_second)
        .archive_all(&args.feeds)
        .await;

    Ok(())
}
