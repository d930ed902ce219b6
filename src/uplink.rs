//! Uplink client: POST feature vectors to the classifier endpoint.

use crate::config::UplinkConfig;
use crate::error::TelemetryError;
use crate::features::FeatureVector;
use std::time::Duration;

#[derive(Clone)]
pub struct UplinkClient {
    client: reqwest::Client,
    endpoint: String,
}

impl UplinkClient {
    /// Build a client for `endpoint`. Returns `None` when the HTTP client
    /// cannot be constructed (e.g. TLS backend unavailable).
    pub fn new(endpoint: &str, config: &UplinkConfig) -> Option<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .ok()?;
        Some(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one vector as a JSON body. Any non-2xx status is an error.
    pub async fn send(&self, vector: &FeatureVector) -> Result<(), TelemetryError> {
        let res = self.client.post(&self.endpoint).json(vector).send().await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(TelemetryError::Status { status, body });
        }
        Ok(())
    }
}
