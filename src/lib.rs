pub mod config;
pub mod provider;
pub mod resolver;
pub mod state;
pub mod updater;

use anyhow::{Context, Result};
use log::info;

use resolver::AddressSource;
use updater::{Outcome, Updater};

/// One detect, compare, update pass.
pub async fn run(source: &dyn AddressSource, updater: &Updater<'_>) -> Result<Outcome> {
    let machine_ip = source
        .current()
        .await
        .context("Failed to query machine's IP address")?;
    info!("External IP address: {}", machine_ip);

    updater.apply(machine_ip).await
}
