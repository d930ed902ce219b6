//! Replays recorded raw events (one JSON object per line) into a session,
//! paced by each event's `t` offset from the session epoch.

use super::{InputSource, RawInputEvent};
use crate::session::EventSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type Reader = Box<dyn AsyncBufRead + Send + Unpin>;

pub struct ReplaySource {
    reader: Option<Reader>,
    task: Option<JoinHandle<()>>,
    finished: Arc<Notify>,
}

impl ReplaySource {
    pub fn new(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Some(Box::new(reader)),
            task: None,
            finished: Arc::new(Notify::new()),
        }
    }

    /// Notified once the input is exhausted or the session stops accepting
    /// events.
    pub fn finished(&self) -> Arc<Notify> {
        self.finished.clone()
    }
}

fn offset(ev: &RawInputEvent) -> Option<Duration> {
    let t = match ev {
        RawInputEvent::PointerMove { t, .. }
        | RawInputEvent::PointerDown { t, .. }
        | RawInputEvent::Wheel { t, .. }
        | RawInputEvent::KeyDown { t, .. }
        | RawInputEvent::KeyUp { t, .. } => (*t)?,
        RawInputEvent::Unknown => return None,
    };
    Duration::try_from_secs_f64(t / 1000.0).ok()
}

async fn replay(reader: Reader, sink: EventSink, finished: Arc<Notify>) {
    let Some(epoch) = sink.epoch() else {
        finished.notify_one();
        return;
    };
    let mut lines = reader.lines();
    let mut line_no = 0u64;
    let mut emitted = 0u64;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "replay input read failed");
                break;
            }
        };
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let ev: RawInputEvent = match serde_json::from_str(&line) {
            Ok(ev) => ev,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping malformed input line");
                continue;
            }
        };
        if let Some(at) = offset(&ev).and_then(|d| epoch.checked_add(d)) {
            tokio::time::sleep_until(at).await;
        }
        if !sink.emit(ev) {
            debug!(line = line_no, "session closed; replay stopping");
            break;
        }
        emitted += 1;
    }
    debug!(lines = line_no, emitted, "replay finished");
    finished.notify_one();
}

impl InputSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    fn attach(&mut self, sink: EventSink) {
        let Some(reader) = self.reader.take() else {
            warn!("replay input already consumed; nothing to attach");
            return;
        };
        self.task = Some(tokio::spawn(replay(reader, sink, self.finished.clone())));
    }

    fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
