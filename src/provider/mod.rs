mod aws;

pub use aws::Route53;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::net::Ipv4Addr;

pub const RECORD_TYPE: &str = "A";
pub const RECORD_TTL: i64 = 300;

/// The desired state of a single A record. Built per update and sent once.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub hosted_zone_id: String,
    pub record_name: String,
    pub address: Ipv4Addr,
}

impl UpdateRequest {
    pub fn comment_at(&self, now: DateTime<Utc>) -> String {
        format!(
            "Updating {} at {}",
            self.record_name,
            now.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Creates the record or overwrites it with the request's address.
    async fn upsert(&self, request: &UpdateRequest) -> Result<()>;
}
