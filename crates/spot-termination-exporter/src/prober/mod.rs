//! Metadata service prober
//!
//! One GET per call against `base_url + path`, classified into a closed set of
//! outcomes. Nothing is retried; the 1 second timeout is terminal.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::PROBE_TIMEOUT;
use crate::contracts::*;
use crate::error::Result;

/// Result of a single metadata probe
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    /// Body decoded successfully
    Found(T),
    /// Endpoint reachable, resource does not exist (404)
    NotFound,
    /// Network error, timeout, or body could not be read
    Unavailable(String),
    /// Endpoint answered but the body did not decode
    Malformed(String),
}

/// HTTP client bound to one metadata base URL
#[derive(Debug, Clone)]
pub struct MetadataProber {
    base_url: String,
    client: reqwest::Client,
}

impl MetadataProber {
    /// Create a prober with the default 1 second timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, PROBE_TIMEOUT)
    }

    /// Create a prober with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { base_url, client })
    }

    /// Full URL of a metadata path
    pub fn url(&self, path: MetadataPath) -> String {
        format!("{}{}", self.base_url, path.as_str())
    }

    /// Fetch a plain-text endpoint, returning the body verbatim
    pub async fn fetch_text(&self, path: MetadataPath) -> ProbeOutcome<String> {
        self.fetch_body(path).await
    }

    /// Fetch a JSON endpoint and decode it into `T`
    pub async fn fetch_json<T: DeserializeOwned>(&self, path: MetadataPath) -> ProbeOutcome<T> {
        match self.fetch_body(path).await {
            ProbeOutcome::Found(body) => match serde_json::from_str::<T>(&body) {
                Ok(value) => ProbeOutcome::Found(value),
                Err(e) => ProbeOutcome::Malformed(e.to_string()),
            },
            ProbeOutcome::NotFound => ProbeOutcome::NotFound,
            ProbeOutcome::Unavailable(e) => ProbeOutcome::Unavailable(e),
            ProbeOutcome::Malformed(e) => ProbeOutcome::Malformed(e),
        }
    }

    /// `instance-id`
    pub async fn instance_id(&self) -> ProbeOutcome<String> {
        self.fetch_text(MetadataPath::InstanceId).await
    }

    /// `instance-type`
    pub async fn instance_type(&self) -> ProbeOutcome<String> {
        self.fetch_text(MetadataPath::InstanceType).await
    }

    /// `spot/instance-action`
    pub async fn instance_action(&self) -> ProbeOutcome<InstanceAction> {
        self.fetch_json(MetadataPath::InstanceAction).await
    }

    /// `events/recommendations/rebalance`
    pub async fn rebalance_notice(&self) -> ProbeOutcome<RebalanceNotice> {
        self.fetch_json(MetadataPath::RebalanceRecommendation).await
    }

    async fn fetch_body(&self, path: MetadataPath) -> ProbeOutcome<String> {
        let url = self.url(path);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return ProbeOutcome::Unavailable(e.to_string()),
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return ProbeOutcome::NotFound;
        }

        if !status.is_success() {
            tracing::warn!(path = %path, status = %status, "Unexpected metadata response status");
        }

        match response.text().await {
            Ok(body) => ProbeOutcome::Found(body),
            Err(e) => ProbeOutcome::Unavailable(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let prober = MetadataProber::new("http://localhost:9092/latest/meta-data").unwrap();
        assert_eq!(
            prober.url(MetadataPath::InstanceId),
            "http://localhost:9092/latest/meta-data/instance-id"
        );
        assert_eq!(
            prober.url(MetadataPath::InstanceAction),
            "http://localhost:9092/latest/meta-data/spot/instance-action"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let prober = MetadataProber::new(format!("http://{}/", addr)).unwrap();
        let outcome = prober.instance_id().await;

        assert!(matches!(outcome, ProbeOutcome::Unavailable(_)));
    }
}
