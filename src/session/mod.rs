//! Session lifecycle: listener attachment, the live window, and the flush cycle.
//!
//! `Unstarted → Active → Stopped`. The live [`WindowAccumulator`] sits behind a
//! single mutex; capture handlers hold it for one O(1) update, and a flush holds
//! it only to swap in the next window. Composition and dispatch run after the
//! lock is released, so a slow send never delays capture.

mod dispatch;
mod scheduler;

pub use dispatch::{Dispatcher, VectorCallback};

use crate::capture::{EventNormalizer, InputSource, RawInputEvent};
use crate::config::{ResponseTimeScope, TelemetryConfig};
use crate::error::TelemetryError;
use crate::features::{FeatureComposer, FeatureVector, WindowAccumulator};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unstarted,
    Active,
    Stopped,
}

enum Phase {
    Unstarted,
    Active {
        shared: Arc<Shared>,
        timer: JoinHandle<()>,
    },
    Stopped,
}

struct LiveWindow {
    acc: WindowAccumulator,
    started: Instant,
    index: u64,
}

pub(crate) struct Shared {
    session_id: Uuid,
    normalizer: EventNormalizer,
    composer: FeatureComposer,
    scope: ResponseTimeScope,
    dispatcher: Dispatcher,
    /// `None` once the session has stopped
    live: Mutex<Option<LiveWindow>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn record(&self, raw: RawInputEvent) -> bool {
        let event = self.normalizer.normalize(raw);
        let mut live = lock(&self.live);
        let Some(window) = live.as_mut() else {
            return false;
        };
        if let Some(event) = event {
            window.acc.apply(&event);
        }
        true
    }

    /// Detach the current window and install the next one in a single
    /// critical section, then compose outside the lock.
    fn flush(&self) -> Option<(u64, FeatureVector)> {
        let (detached, elapsed, index) = {
            let mut live = lock(&self.live);
            let window = live.as_mut()?;
            let now = Instant::now();
            let now_ms = now
                .saturating_duration_since(self.normalizer.epoch())
                .as_secs_f64()
                * 1000.0;
            let detached = window.acc.detach(self.scope, now_ms);
            let elapsed = now.saturating_duration_since(window.started);
            let index = window.index;
            window.started = now;
            window.index += 1;
            (detached, elapsed, index)
        };

        let vector = self.composer.compose(&detached, elapsed);
        debug!(
            session_id = %self.session_id,
            window = index,
            duration_secs = vector.interaction_duration,
            path_length = vector.mouse_path_length,
            clicks = detached.click_count(),
            "window flushed"
        );
        Some((index, vector))
    }

    /// Returns false once the session has stopped.
    fn flush_and_dispatch(&self) -> bool {
        match self.flush() {
            Some((index, vector)) => {
                self.dispatcher.dispatch(vector, index);
                true
            }
            None => false,
        }
    }
}

/// Handle given to input sources. Holds no ownership of the session: once the
/// session stops or is dropped, emitted events are discarded.
#[derive(Clone)]
pub struct EventSink {
    shared: Weak<Shared>,
}

impl EventSink {
    /// Feed one raw event. Returns false when the session no longer accepts
    /// events, so sources can stop producing.
    pub fn emit(&self, raw: RawInputEvent) -> bool {
        self.shared
            .upgrade()
            .map(|shared| shared.record(raw))
            .unwrap_or(false)
    }

    /// Session epoch that event timestamps are relative to.
    pub fn epoch(&self) -> Option<Instant> {
        self.shared.upgrade().map(|s| s.normalizer.epoch())
    }
}

pub struct Session {
    id: Uuid,
    config: TelemetryConfig,
    dispatcher: Dispatcher,
    sources: Vec<Box<dyn InputSource>>,
    phase: Phase,
}

impl Session {
    pub fn new(config: TelemetryConfig, dispatcher: Dispatcher) -> Result<Self, TelemetryError> {
        config.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            dispatcher,
            sources: Vec::new(),
            phase: Phase::Unstarted,
        })
    }

    /// Register an input source to be attached on [`Session::start`].
    pub fn with_source(mut self, source: impl InputSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Unstarted => SessionState::Unstarted,
            Phase::Active { .. } => SessionState::Active,
            Phase::Stopped => SessionState::Stopped,
        }
    }

    /// Capture the epoch, attach sources and start the flush timer. Must be
    /// called from within a tokio runtime. A session starts at most once.
    pub fn start(&mut self) -> Result<(), TelemetryError> {
        match self.phase {
            Phase::Unstarted => {}
            Phase::Active { .. } => {
                return Err(TelemetryError::Lifecycle("session already started".into()))
            }
            Phase::Stopped => {
                return Err(TelemetryError::Lifecycle(
                    "stopped sessions cannot be restarted".into(),
                ))
            }
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| TelemetryError::Lifecycle("start() requires a tokio runtime".into()))?;

        let epoch = Instant::now();
        let shared = Arc::new(Shared {
            session_id: self.id,
            normalizer: EventNormalizer::new(epoch),
            composer: FeatureComposer::new(self.config.result_label),
            scope: self.config.response_time_scope,
            dispatcher: self.dispatcher.clone(),
            live: Mutex::new(Some(LiveWindow {
                acc: WindowAccumulator::new(),
                started: epoch,
                index: 0,
            })),
        });

        for source in &mut self.sources {
            source.attach(EventSink {
                shared: Arc::downgrade(&shared),
            });
            debug!(session_id = %self.id, source = source.name(), "input source attached");
        }
        let timer = scheduler::spawn(
            &runtime,
            Arc::downgrade(&shared),
            epoch,
            self.config.window_duration(),
        );
        self.phase = Phase::Active { shared, timer };

        info!(
            session_id = %self.id,
            window_ms = self.config.window_duration_ms,
            sources = self.sources.len(),
            uplink = self.dispatcher.has_uplink(),
            "session started"
        );
        Ok(())
    }

    /// Direct listener entry point; equivalent to emitting through a sink.
    pub fn record(&self, raw: RawInputEvent) -> bool {
        match &self.phase {
            Phase::Active { shared, .. } => shared.record(raw),
            _ => false,
        }
    }

    /// A sink for hosts that deliver events from elsewhere (another task, an
    /// FFI callback). `None` unless the session is active.
    pub fn sink(&self) -> Option<EventSink> {
        match &self.phase {
            Phase::Active { shared, .. } => Some(EventSink {
                shared: Arc::downgrade(shared),
            }),
            _ => None,
        }
    }

    /// Close the current window immediately, dispatch it, and return it.
    /// The timer keeps its own cadence.
    pub fn flush(&self) -> Option<FeatureVector> {
        let Phase::Active { shared, .. } = &self.phase else {
            return None;
        };
        let (index, vector) = shared.flush()?;
        shared.dispatcher.dispatch(vector.clone(), index);
        Some(vector)
    }

    /// Cancel the timer, detach sources and drop the live window. Idempotent;
    /// sends already in flight run to completion on their own. A session that
    /// was never started stays `Unstarted`.
    pub fn stop(&mut self) {
        if !matches!(self.phase, Phase::Active { .. }) {
            return;
        }
        let Phase::Active { shared, timer } = std::mem::replace(&mut self.phase, Phase::Stopped)
        else {
            return;
        };
        timer.abort();
        for source in &mut self.sources {
            source.detach();
            debug!(session_id = %self.id, source = source.name(), "input source detached");
        }
        lock(&shared.live).take();
        info!(session_id = %self.id, "session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn collecting_session(
        config: TelemetryConfig,
    ) -> (Session, Arc<std::sync::Mutex<Vec<FeatureVector>>>) {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let dispatcher = Dispatcher::new().with_callback(move |v| sink.lock().unwrap().push(v.clone()));
        (Session::new(config, dispatcher).unwrap(), seen)
    }

    #[test]
    fn rejects_invalid_config() {
        let config = TelemetryConfig {
            window_duration_ms: 0,
            ..Default::default()
        };
        assert!(Session::new(config, Dispatcher::new()).is_err());
    }

    #[test]
    fn start_outside_runtime_fails() {
        let (mut session, _) = collecting_session(TelemetryConfig::default());
        assert!(matches!(session.start(), Err(TelemetryError::Lifecycle(_))));
        assert_eq!(session.state(), SessionState::Unstarted);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_start_keeps_session_unstarted() {
        let (mut session, _) = collecting_session(TelemetryConfig::default());
        session.stop();
        assert_eq!(session.state(), SessionState::Unstarted);
        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Active);
        session.stop();
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_transitions() {
        let (mut session, _) = collecting_session(TelemetryConfig::default());
        assert!(!session.record(RawInputEvent::pointer_move(1.0, 1.0, 0.0)));

        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.start().is_err());
        assert!(session.record(RawInputEvent::pointer_move(1.0, 1.0, 0.0)));

        session.stop();
        session.stop();
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(session.start().is_err());
        assert!(!session.record(RawInputEvent::pointer_move(2.0, 2.0, 10.0)));
        assert!(session.flush().is_none());
        assert!(session.sink().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_flushes_each_window() {
        let (mut session, seen) = collecting_session(TelemetryConfig::default());
        session.start().unwrap();
        session.record(RawInputEvent::pointer_move(10.0, 20.0, 100.0));
        session.record(RawInputEvent::pointer_down(10.0, 20.0, 100.0));

        tokio::time::sleep(Duration::from_millis(5_001)).await;
        {
            let v = seen.lock().unwrap();
            assert_eq!(v.len(), 1);
            assert_eq!(v[0].interaction_duration, 5.0);
            assert_eq!(v[0].mouse_click_frequency, 0.2);
            assert_eq!(v[0].avg_click_x, 10.0);
            assert_eq!(v[0].response_time, 0.1);
        }

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        let v = seen.lock().unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[1].mouse_click_frequency, 0.0);
        assert_eq!(v[1].interaction_duration, 5.0);
        // session-scoped marker persists
        assert_eq!(v[1].response_time, 0.1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_flush_shortens_next_window() {
        let (mut session, seen) = collecting_session(TelemetryConfig::default());
        session.start().unwrap();

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        let v = session.flush().unwrap();
        assert_eq!(v.interaction_duration, 2.0);

        tokio::time::sleep(Duration::from_millis(3_001)).await;
        let v = seen.lock().unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[1].interaction_duration, 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_timer() {
        let (mut session, seen) = collecting_session(TelemetryConfig::default());
        session.start().unwrap();
        let sink = session.sink().unwrap();
        session.stop();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(seen.lock().unwrap().is_empty());
        assert!(!sink.emit(RawInputEvent::wheel(10.0, 0.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_session_detaches_sinks() {
        let (mut session, _) = collecting_session(TelemetryConfig::default());
        session.start().unwrap();
        let sink = session.sink().unwrap();
        assert!(sink.epoch().is_some());
        drop(session);
        assert!(!sink.emit(RawInputEvent::key_down("a", 0.0)));
        assert!(sink.epoch().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn window_scoped_response_time() {
        let config = TelemetryConfig {
            response_time_scope: ResponseTimeScope::Window,
            ..Default::default()
        };
        let (mut session, _) = collecting_session(config);
        session.start().unwrap();
        session.record(RawInputEvent::pointer_move(0.0, 0.0, 400.0));

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(session.flush().unwrap().response_time, 0.4);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let v = session.flush().unwrap();
        assert_eq!(v.response_time, 0.0);

        session.record(RawInputEvent::pointer_move(5.0, 0.0, 1_750.0));
        let v = session.flush().unwrap();
        assert_eq!(v.response_time, 0.25);
    }
}
