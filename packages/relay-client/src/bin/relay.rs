//! Relay CLI: relays a transaction (or batch) read from a file or stdin.

use clap::Parser;
use relay_client::{Env, Handlers, RelayClient, RelayerConfig, Transaction};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "relay", about = "Relay MultiversX transactions through a fee sponsor")]
struct Args {
    /// Plain-object transaction JSON. Reads stdin when omitted.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Input is a JSON array relayed as one batch.
    #[arg(short, long)]
    batch: bool,

    /// Relay regardless of sender balance.
    #[arg(long)]
    force: bool,

    #[arg(long)]
    env: Option<Env>,

    #[arg(long)]
    project: Option<String>,

    /// Relay API base URL.
    #[arg(long)]
    api: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = RelayerConfig::load().unwrap_or_else(|e| {
        // Fall back only when the project comes from the command line.
        match &args.project {
            Some(project) if e.to_string().contains("missing field") => {
                warn!(error = %e, "No config found, using defaults");
                RelayerConfig::new(project.clone())
            }
            _ => {
                error!(error = %e, "FATAL: config error, set RELAY_PROJECT or relay.toml");
                std::process::exit(1);
            }
        }
    });

    if let Some(project) = args.project {
        config.project = project.into();
    }
    if let Some(env) = args.env {
        config.env = env;
    }
    if let Some(api) = args.api {
        config.api = Some(api);
    }
    if let Some(ms) = args.timeout {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    if args.force {
        config.force = true;
    }

    let input = match &args.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let client = RelayClient::new(config)?;
    info!(api = %client.config().api, "Configuration loaded");
    let handlers = Handlers::default();

    let output = if args.batch {
        let txs: Vec<Transaction> = serde_json::from_str(&input)?;
        let relayed = client.relay_batch_or_fail(txs, &handlers).await?;
        serde_json::to_string_pretty(&relayed)?
    } else {
        let tx: Transaction = serde_json::from_str(&input)?;
        let relayed = client.relay_or_fail(tx, &handlers).await?;
        serde_json::to_string_pretty(&relayed)?
    };

    println!("{output}");
    Ok(())
}
