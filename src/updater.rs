use anyhow::{Context, Result};
use log::info;
use std::net::Ipv4Addr;

use crate::provider::{Provider, UpdateRequest};
use crate::state::StateFile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Unchanged(Ipv4Addr),
    Updated {
        previous: Option<Ipv4Addr>,
        current: Ipv4Addr,
    },
}

/// Publishes an address only when it differs from the last one published
/// for this record.
pub struct Updater<'a> {
    provider: &'a dyn Provider,
    state: &'a StateFile,
    hosted_zone_id: String,
    record_name: String,
}

impl<'a> Updater<'a> {
    pub fn new(
        provider: &'a dyn Provider,
        state: &'a StateFile,
        hosted_zone_id: &'_ str,
        record_name: &'_ str,
    ) -> Self {
        Self {
            provider,
            state,
            hosted_zone_id: hosted_zone_id.to_string(),
            record_name: record_name.to_string(),
        }
    }

    /// The state file is only rewritten after the provider has accepted the
    /// change, so a failed upsert is retried on the next run.
    pub async fn apply(&self, current: Ipv4Addr) -> Result<Outcome> {
        let previous = self.state.load()?;

        if previous == Some(current) {
            info!("{} unchanged at {}", self.record_name, current);
            return Ok(Outcome::Unchanged(current));
        }

        match previous {
            Some(ip) => info!("IP changed from {} to {}, updating route53", ip, current),
            None => info!("No previous IP for {}, updating route53", self.record_name),
        }

        let request = UpdateRequest {
            hosted_zone_id: self.hosted_zone_id.clone(),
            record_name: self.record_name.clone(),
            address: current,
        };
        self.provider
            .upsert(&request)
            .await
            .with_context(|| format!("Failed to update record for {}", self.record_name))?;

        self.state.store(&current)?;
        info!("Successfully updated {} to {}", self.record_name, current);

        Ok(Outcome::Updated { previous, current })
    }
}
