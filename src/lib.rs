//! Behavior Telemetry: windowed behavioral feature extraction for bot detection.
//!
//! Modular structure:
//! - [`capture`]: Raw platform events, normalization, input sources
//! - [`features`]: Per-window accumulation and feature-vector composition
//! - [`session`]: Lifecycle, flush timer, vector dispatch
//! - [`uplink`]: Classifier endpoint client
//! - [`config`]: Host-supplied configuration
//! - [`logging`]: Structured logging

pub mod capture;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod session;
pub mod uplink;

pub use capture::{InputEvent, InputSource, RawInputEvent, ReplaySource};
pub use config::{ResponseTimeScope, TelemetryConfig};
pub use error::TelemetryError;
pub use features::{FeatureComposer, FeatureVector, ResultLabel, WindowAccumulator};
pub use logging::StructuredLogger;
pub use session::{Dispatcher, EventSink, Session, SessionState};
pub use uplink::UplinkClient;
