//! Engine configuration. Supplied by the hosting application, never inferred.

use crate::error::TelemetryError;
use crate::features::ResultLabel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TelemetryConfig {
    /// Flush period (milliseconds)
    pub window_duration_ms: u64,
    /// Classifier endpoint; vectors are only handed to the callback when absent
    pub endpoint_url: Option<String>,
    /// Label attached to every vector (0 = human, 1 = bot)
    pub result_label: ResultLabel,
    /// Whether the first-interaction marker lives for the session or one window
    pub response_time_scope: ResponseTimeScope,
    pub uplink: UplinkConfig,
    pub log: LogConfig,
}

/// Persistence scope of the first-interaction marker behind `Response_Time`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTimeScope {
    /// Frozen at the first pointer move of the session, measured from session start.
    #[default]
    Session,
    /// Cleared at every flush, measured from the start of the current window.
    Window,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UplinkConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            window_duration_ms: 5000,
            endpoint_url: None,
            result_label: ResultLabel::Human,
            response_time_scope: ResponseTimeScope::Session,
            uplink: UplinkConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5000,
            request_timeout_ms: 15000,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl TelemetryConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<TelemetryConfig>(&data) {
                    Ok(c) => return c,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "config unparsable; using defaults")
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "config unreadable; using defaults")
                }
            }
        }
        Self::default()
    }

    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.window_duration_ms == 0 {
            return Err(TelemetryError::Config(
                "windowDurationMs must be greater than zero".into(),
            ));
        }
        if let Some(url) = &self.endpoint_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(TelemetryError::Config(format!(
                    "endpointUrl must be an http(s) URL, got {url:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn window_duration(&self) -> Duration {
        Duration::from_millis(self.window_duration_ms)
    }
}
