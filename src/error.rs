//! Error types for the telemetry engine.

use thiserror::Error;

/// Errors surfaced by configuration, lifecycle and uplink operations.
///
/// The capture path never returns these; a malformed input event is defaulted
/// or dropped instead.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Session lifecycle error: {0}")]
    Lifecycle(String),
}
