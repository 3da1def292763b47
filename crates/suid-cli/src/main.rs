#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use anyhow::{Context, bail};
use clap::Parser;
use config::{CliArgs, CliConfig};
use suid::{Dispenser, FileStore, HttpTransport};
use telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let store = FileStore::open(&config.store_dir)
        .with_context(|| format!("unable to open {}", config.store_dir.display()))?;
    let mut builder = Dispenser::builder(store, HttpTransport::new()?).pool_key(&config.pool_key);
    for update in &config.updates {
        builder = builder.config(update.clone());
    }
    let dispenser = builder.build()?;

    if tokio::time::timeout(config.ready_timeout, dispenser.ready_async())
        .await
        .is_err()
    {
        dispenser.shutdown();
        bail!(
            "no suid blocks available after {:?}; is a server configured?",
            config.ready_timeout
        );
    }

    let result = issue(&dispenser, config.count);
    dispenser.shutdown();
    result
}

fn issue(dispenser: &Dispenser<FileStore, HttpTransport>, count: usize) -> anyhow::Result<()> {
    for _ in 0..count {
        println!("{}", dispenser.next()?);
    }
    Ok(())
}

fn log_startup_info(config: &CliConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting suid-cli with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting suid-cli against {} with pool {:?} in {}",
            config.effective.server.as_deref().unwrap_or("<no server>"),
            config.pool_key,
            config.store_dir.display()
        );
    }
}
