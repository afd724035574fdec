//! HTTP adapter for the containerized fetcher.
//!
//! The fetcher owns the upstream protocol session and writes records to
//! its own sink; this side only passes cursors in and reads message
//! records back. The container can sleep when idle and take significant
//! time to warm up, so the request timeout is the tick budget rather than
//! anything short — the first request after a sleep doubles as the warm-up.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use telepull_core::{CursorSet, MessageRecord};

use crate::error::FetchError;

/// Interface to the upstream fetcher collaborator.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Request every message newer than the given cursors. An empty
    /// cursor set is the first-run case; the fetcher decides how much
    /// history to return.
    async fn fetch(&self, cursors: &CursorSet) -> Result<Vec<MessageRecord>, FetchError>;
}

/// Fetcher speaking plain HTTP to the container endpoint.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Comma-joined channel ids, the canonical `lastMessageIds` form.
fn join_channel_ids(cursors: &CursorSet) -> String {
    cursors
        .keys()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a response body. The top level must be a JSON array; elements
/// that fail to decode into a record are logged and dropped rather than
/// failing the whole response.
fn decode_records(body: &str) -> Result<Vec<MessageRecord>, FetchError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(body)?;
    let mut records = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<MessageRecord>(value) {
            Ok(record) => records.push(record),
            Err(e) => warn!(error = %e, "dropping malformed record"),
        }
    }
    Ok(records)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, cursors: &CursorSet) -> Result<Vec<MessageRecord>, FetchError> {
        let last_message_ids = join_channel_ids(cursors);
        debug!(channels = cursors.len(), url = %self.base_url, "requesting fetcher");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("lastMessageIds", last_message_ids.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        decode_records(&body)
    }
}
