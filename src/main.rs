//! Behavior telemetry host: replays raw input events (ndjson on stdin) through a
//! live session, printing each window's vector as a JSON line on stdout and,
//! when an endpoint is configured, posting it to the classifier.

use behavior_telemetry::{
    capture::ReplaySource,
    config::TelemetryConfig,
    logging::StructuredLogger,
    session::{Dispatcher, Session},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("TELEMETRY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("telemetry.json"));
    let config = TelemetryConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(
        config = ?config_path,
        window_ms = config.window_duration_ms,
        endpoint = config.endpoint_url.as_deref().unwrap_or("-"),
        "behavior telemetry starting"
    );

    let drain_limit = Duration::from_millis(config.uplink.request_timeout_ms);
    let dispatcher = Dispatcher::from_config(&config).with_callback(|vector| {
        let mut out = std::io::stdout().lock();
        if let Err(e) = StructuredLogger::emit_json(vector, &mut out) {
            warn!(error = %e, "vector write failed");
        }
    });

    let source = ReplaySource::new(tokio::io::BufReader::new(tokio::io::stdin()));
    let finished = source.finished();
    let mut session = Session::new(config, dispatcher.clone())?.with_source(source);

    let interrupted = Arc::new(Notify::new());
    let on_signal = interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || on_signal.notify_one()) {
        warn!(error = %e, "Ctrl+C handler unavailable");
    }

    session.start()?;
    info!(session_id = %session.id(), "session active (Ctrl+C to stop)");

    tokio::select! {
        _ = finished.notified() => {
            info!("input exhausted; flushing final window");
            session.flush();
        }
        _ = interrupted.notified() => info!("interrupted"),
    }
    session.stop();

    if !dispatcher.drain(drain_limit).await {
        warn!(pending = dispatcher.in_flight(), "abandoning in-flight sends");
    }
    info!("behavior telemetry stopped");
    Ok(())
}
