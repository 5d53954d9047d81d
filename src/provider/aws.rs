use anyhow::{anyhow, Result};
use chrono::Utc;
use log::info;
use rusoto_core::Region;
use rusoto_route53::{
    Change, ChangeBatch, ChangeResourceRecordSetsRequest, ResourceRecord, ResourceRecordSet,
    Route53 as _, Route53Client,
};

use crate::provider::{Provider, UpdateRequest, RECORD_TTL, RECORD_TYPE};

const UPSERT: &str = "UPSERT";

/// Route53 hosted zone records. Credentials and region come from the
/// environment through rusoto's default chains unless a client is supplied.
pub struct Route53 {
    client: Route53Client,
}

impl Route53 {
    pub fn new() -> Self {
        Self::with_client(Route53Client::new(Region::default()))
    }

    pub fn with_client(client: Route53Client) -> Self {
        Self { client }
    }
}

impl Default for Route53 {
    fn default() -> Self {
        Self::new()
    }
}

fn change_request(req: &UpdateRequest, comment: String) -> ChangeResourceRecordSetsRequest {
    ChangeResourceRecordSetsRequest {
        change_batch: ChangeBatch {
            changes: vec![Change {
                action: String::from(UPSERT),
                resource_record_set: ResourceRecordSet {
                    name: req.record_name.clone(),
                    resource_records: Some(vec![ResourceRecord {
                        value: req.address.to_string(),
                    }]),
                    ttl: Some(RECORD_TTL),
                    type_: String::from(RECORD_TYPE),
                    ..Default::default()
                },
            }],
            comment: Some(comment),
        },
        hosted_zone_id: req.hosted_zone_id.clone(),
    }
}

#[async_trait::async_trait]
impl Provider for Route53 {
    async fn upsert(&self, req: &UpdateRequest) -> Result<()> {
        let res = self
            .client
            .change_resource_record_sets(change_request(req, req.comment_at(Utc::now())))
            .await
            .map_err(|e| anyhow!(e))?;

        info!(
            "Change {} is {} (submitted {})",
            res.change_info.id, res.change_info.status, res.change_info.submitted_at
        );
        Ok(())
    }
}
