//! JSON or plain log lines on stderr; stdout stays free for vector output.

use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber; level from RUST_LOG, else `default_level`.
    /// Logs go to stderr because stdout carries the ndjson vector stream.
    /// Returns false if a subscriber was already installed.
    pub fn init(json: bool, default_level: &str) -> bool {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt)
                .try_init()
                .is_ok()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .is_ok()
        }
    }

    /// Write one value as a single JSON line (ndjson), bypassing tracing.
    pub fn emit_json(value: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(value)?;
        writeln!(w, "{}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_refused() {
        let _ = StructuredLogger::init(false, "info");
        assert!(!StructuredLogger::init(true, "debug"));
    }

    #[test]
    fn emit_json_writes_one_line() {
        let mut out = Vec::new();
        StructuredLogger::emit_json(&serde_json::json!({"Mouse_Stops": 3}), &mut out).unwrap();
        StructuredLogger::emit_json(&serde_json::json!({"Mouse_Stops": 4}), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "{\"Mouse_Stops\":3}\n{\"Mouse_Stops\":4}\n");
    }
}
