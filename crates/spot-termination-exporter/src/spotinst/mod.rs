//! Spotinst fleet-management status lookup
//!
//! Optional. Every failure collapses into [`LIFECYCLE_NOT_AVAILABLE`].

use std::time::Duration;

use thiserror::Error;

use crate::config::{SpotinstConfig, PROBE_TIMEOUT};
use crate::contracts::*;
use crate::error::Result;

/// Failure of a single Spotinst lookup
#[derive(Debug, Error)]
pub enum SpotinstError {
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("invalid response body: {0}")]
    Parse(#[source] reqwest::Error),
}

/// Client for the Spotinst instance endpoint
#[derive(Debug, Clone)]
pub struct SpotinstClient {
    config: SpotinstConfig,
    client: reqwest::Client,
}

impl SpotinstClient {
    pub fn new(config: SpotinstConfig) -> Result<Self> {
        Self::with_timeout(config, PROBE_TIMEOUT)
    }

    pub fn with_timeout(config: SpotinstConfig, timeout: Duration) -> Result<Self> {
        if !config.has_credentials() {
            tracing::warn!("Spotinst token or account ID missing, lifecycle state will be not_available");
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { config, client })
    }

    /// Lifecycle state reported for `instance_id`, or `not_available`
    pub async fn lifecycle_state(&self, instance_id: &str) -> String {
        if !self.config.has_credentials() {
            return LIFECYCLE_NOT_AVAILABLE.to_string();
        }

        match self.fetch(instance_id).await {
            Ok(response) => match response.lifecycle_state() {
                Some(state) => state.to_string(),
                None => {
                    tracing::debug!(
                        instance_id,
                        count = response.response.count,
                        "Spotinst returned no lifecycle state"
                    );
                    LIFECYCLE_NOT_AVAILABLE.to_string()
                }
            },
            Err(e) => {
                tracing::error!(instance_id, error = %e, "Spotinst lookup failed");
                LIFECYCLE_NOT_AVAILABLE.to_string()
            }
        }
    }

    async fn fetch(&self, instance_id: &str) -> std::result::Result<SpotinstResponse, SpotinstError> {
        let url = format!("{}/aws/ec2/instance/{}", self.config.api_url, instance_id);

        let response = self
            .client
            .get(&url)
            .query(&[("accountId", self.config.account_id.as_str())])
            .bearer_auth(&self.config.token)
            .header("Content-Type", "application/json; charset=utf-8")
            .send()
            .await
            .map_err(SpotinstError::Network)?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "Spotinst API returned non-success status");
        }

        response
            .json::<SpotinstResponse>()
            .await
            .map_err(SpotinstError::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_url: impl Into<String>, token: &str) -> SpotinstConfig {
        SpotinstConfig {
            api_url: api_url.into(),
            token: token.to_string(),
            account_id: "act-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_short_circuit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = SpotinstClient::new(config(server.uri(), "")).unwrap();

        assert_eq!(client.lifecycle_state("i-1").await, LIFECYCLE_NOT_AVAILABLE);
        assert_eq!(client.lifecycle_state("i-1").await, LIFECYCLE_NOT_AVAILABLE);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = SpotinstClient::new(config(format!("http://{}", addr), "tok")).unwrap();

        let err = client.fetch("i-1").await.unwrap_err();
        assert!(matches!(err, SpotinstError::Network(_)));
        assert!(err.to_string().starts_with("request failed"));
        assert_eq!(client.lifecycle_state("i-1").await, LIFECYCLE_NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/aws/ec2/instance/i-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = SpotinstClient::new(config(server.uri(), "tok")).unwrap();

        let err = client.fetch("i-1").await.unwrap_err();
        assert!(matches!(err, SpotinstError::Parse(_)));
        assert!(err.to_string().starts_with("invalid response body"));
        assert_eq!(client.lifecycle_state("i-1").await, LIFECYCLE_NOT_AVAILABLE);
    }
}
