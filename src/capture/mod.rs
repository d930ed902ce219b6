//! Input capture: platform-shaped raw events, the normalized event vocabulary,
//! and the listener seam through which hosts feed a session.

mod normalizer;
mod replay;
mod source;

use serde::{Deserialize, Serialize};

pub use normalizer::EventNormalizer;
pub use replay::ReplaySource;
pub use source::InputSource;

/// Raw event as delivered by the hosting platform.
///
/// Every payload field is optional: a single malformed event must never halt
/// capture, so absent fields are defaulted during normalization. Unrecognized
/// `type` tags land in [`RawInputEvent::Unknown`] and are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawInputEvent {
    PointerMove {
        x: Option<f64>,
        y: Option<f64>,
        /// Milliseconds since session start; stamped on arrival when absent
        t: Option<f64>,
    },
    PointerDown {
        x: Option<f64>,
        y: Option<f64>,
        t: Option<f64>,
    },
    Wheel {
        #[serde(rename = "deltaY", alias = "delta_y")]
        delta_y: Option<f64>,
        t: Option<f64>,
    },
    KeyDown {
        key: Option<String>,
        t: Option<f64>,
    },
    KeyUp {
        key: Option<String>,
        t: Option<f64>,
    },
    #[serde(other)]
    Unknown,
}

impl RawInputEvent {
    pub fn pointer_move(x: f64, y: f64, t: f64) -> Self {
        Self::PointerMove {
            x: Some(x),
            y: Some(y),
            t: Some(t),
        }
    }

    pub fn pointer_down(x: f64, y: f64, t: f64) -> Self {
        Self::PointerDown {
            x: Some(x),
            y: Some(y),
            t: Some(t),
        }
    }

    pub fn wheel(delta_y: f64, t: f64) -> Self {
        Self::Wheel {
            delta_y: Some(delta_y),
            t: Some(t),
        }
    }

    pub fn key_down(key: impl Into<String>, t: f64) -> Self {
        Self::KeyDown {
            key: Some(key.into()),
            t: Some(t),
        }
    }

    pub fn key_up(key: impl Into<String>, t: f64) -> Self {
        Self::KeyUp {
            key: Some(key.into()),
            t: Some(t),
        }
    }
}

/// Pointer position in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Key identifier as reported by the platform (`"a"`, `"Shift"`, `"Backspace"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Key(pub String);

impl Key {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backspace and Delete count as error corrections.
    pub fn is_deletion(&self) -> bool {
        matches!(self.0.as_str(), "Backspace" | "Delete")
    }

    pub fn is_special(&self) -> bool {
        self.is_deletion() || self.0 == "Shift"
    }
}

/// Normalized event consumed by the window accumulator. Timestamps are
/// milliseconds since session start.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerMove { pos: Point, t: f64 },
    PointerDown { pos: Point, t: f64 },
    Wheel { delta_y: f64, t: f64 },
    KeyDown { key: Key, t: f64 },
    KeyUp { key: Key, t: f64 },
}

impl InputEvent {
    pub fn timestamp(&self) -> f64 {
        match self {
            InputEvent::PointerMove { t, .. }
            | InputEvent::PointerDown { t, .. }
            | InputEvent::Wheel { t, .. }
            | InputEvent::KeyDown { t, .. }
            | InputEvent::KeyUp { t, .. } => *t,
        }
    }
}
