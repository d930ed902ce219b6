//! Running per-window state, updated in O(1) per normalized event.

use crate::capture::{InputEvent, Key, Point};
use crate::config::ResponseTimeScope;
use std::collections::HashMap;

/// Movement below this distance (px) between consecutive samples is a stop.
pub const STOP_DISTANCE_PX: f64 = 2.0;

/// Upper bound on simultaneously open key holds; further key-downs are not timed.
const MAX_OPEN_HOLDS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// Positive deltas scroll down; zero and negative deltas count as up.
    pub fn from_delta(delta_y: f64) -> Self {
        if delta_y > 0.0 {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WindowAccumulator {
    pub(super) path_length: f64,
    pub(super) max_speed: f64,
    pub(super) stops: u32,
    pub(super) clicks: u32,
    pub(super) scroll_distance: f64,
    pub(super) scroll_direction_changes: u32,
    pub(super) typing_count: u32,
    pub(super) special_keys: u32,
    pub(super) error_corrections: u32,
    pub(super) click_positions: Vec<Point>,
    pub(super) key_holds: Vec<f64>,

    // Position state: survives the window boundary
    last_pointer: Option<(Point, f64)>,
    last_scroll: Option<ScrollDirection>,
    open_holds: HashMap<Key, f64>,

    /// Reference time (ms) the first pointer move's latency is measured from
    interaction_origin_ms: f64,
    pub(super) response_latency_ms: Option<f64>,
}

impl WindowAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerMove { pos, t } => self.on_pointer_move(*pos, *t),
            InputEvent::PointerDown { pos, .. } => {
                self.clicks += 1;
                self.click_positions.push(*pos);
            }
            InputEvent::Wheel { delta_y, .. } => self.on_wheel(*delta_y),
            InputEvent::KeyDown { key, t } => self.on_key_down(key, *t),
            InputEvent::KeyUp { key, t } => self.on_key_up(key, *t),
        }
    }

    fn on_pointer_move(&mut self, pos: Point, t: f64) {
        // Response latency is taken from the first pointer move only
        if self.response_latency_ms.is_none() {
            self.response_latency_ms = Some((t - self.interaction_origin_ms).max(0.0));
        }
        if let Some((prev, prev_t)) = self.last_pointer {
            let d = prev.distance_to(&pos);
            self.path_length += d;
            let dt = t - prev_t;
            if dt > 0.0 {
                self.max_speed = self.max_speed.max(d / dt);
            }
            if d < STOP_DISTANCE_PX {
                self.stops += 1;
            }
        }
        self.last_pointer = Some((pos, t));
    }

    fn on_wheel(&mut self, delta_y: f64) {
        let direction = ScrollDirection::from_delta(delta_y);
        if matches!(self.last_scroll, Some(prev) if prev != direction) {
            self.scroll_direction_changes += 1;
        }
        self.scroll_distance += delta_y.abs();
        self.last_scroll = Some(direction);
    }

    fn on_key_down(&mut self, key: &Key, t: f64) {
        if key.is_deletion() {
            self.error_corrections += 1;
        }
        if key.is_special() {
            self.special_keys += 1;
        }
        if !self.open_holds.contains_key(key) && self.open_holds.len() < MAX_OPEN_HOLDS {
            self.open_holds.insert(key.clone(), t);
        }
    }

    fn on_key_up(&mut self, key: &Key, t: f64) {
        if let Some(down_t) = self.open_holds.remove(key) {
            self.key_holds.push((t - down_t).max(0.0));
        }
        self.typing_count += 1;
    }

    /// Detach this window's state and leave a fresh accumulator in its place.
    ///
    /// Counters and sequences start over. Pointer position, scroll direction
    /// and open key holds carry into the new window, so a segment spanning the
    /// boundary is counted once, by the window of the event that completes it.
    /// `now_ms` is the boundary time, used as the latency origin under
    /// [`ResponseTimeScope::Window`].
    pub fn detach(&mut self, scope: ResponseTimeScope, now_ms: f64) -> WindowAccumulator {
        let (origin, latency) = match scope {
            ResponseTimeScope::Session => (self.interaction_origin_ms, self.response_latency_ms),
            ResponseTimeScope::Window => (now_ms, None),
        };
        let next = WindowAccumulator {
            last_pointer: self.last_pointer,
            last_scroll: self.last_scroll,
            open_holds: std::mem::take(&mut self.open_holds),
            interaction_origin_ms: origin,
            response_latency_ms: latency,
            ..Default::default()
        };
        std::mem::replace(self, next)
    }

    pub fn click_count(&self) -> u32 {
        self.clicks
    }

    pub fn open_hold_count(&self) -> usize {
        self.open_holds.len()
    }
}
