//! Raw platform events → normalized [`InputEvent`]s. Pure mapping, no buffering.

use super::{InputEvent, Key, Point, RawInputEvent};
use tokio::time::Instant;

pub struct EventNormalizer {
    epoch: Instant,
}

impl EventNormalizer {
    pub fn new(epoch: Instant) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Milliseconds elapsed since the session epoch.
    pub fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Map a raw event into the internal vocabulary. Returns `None` for
    /// unrecognized variants; absent or non-finite fields become 0.
    pub fn normalize(&self, raw: RawInputEvent) -> Option<InputEvent> {
        let ev = match raw {
            RawInputEvent::PointerMove { x, y, t } => InputEvent::PointerMove {
                pos: point(x, y),
                t: self.stamp(t),
            },
            RawInputEvent::PointerDown { x, y, t } => InputEvent::PointerDown {
                pos: point(x, y),
                t: self.stamp(t),
            },
            RawInputEvent::Wheel { delta_y, t } => InputEvent::Wheel {
                delta_y: finite_or_zero(delta_y),
                t: self.stamp(t),
            },
            RawInputEvent::KeyDown { key, t } => InputEvent::KeyDown {
                key: Key(key.unwrap_or_default()),
                t: self.stamp(t),
            },
            RawInputEvent::KeyUp { key, t } => InputEvent::KeyUp {
                key: Key(key.unwrap_or_default()),
                t: self.stamp(t),
            },
            RawInputEvent::Unknown => {
                tracing::trace!("dropping unrecognized input event");
                return None;
            }
        };
        Some(ev)
    }

    fn stamp(&self, t: Option<f64>) -> f64 {
        match t {
            Some(t) if t.is_finite() => t.max(0.0),
            _ => self.now_ms(),
        }
    }
}

fn point(x: Option<f64>, y: Option<f64>) -> Point {
    Point::new(finite_or_zero(x), finite_or_zero(y))
}

fn finite_or_zero(v: Option<f64>) -> f64 {
    v.filter(|v| v.is_finite()).unwrap_or(0.0)
}
