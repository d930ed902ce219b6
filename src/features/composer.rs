//! Detached window state + elapsed duration → [`FeatureVector`].

use super::{FeatureVector, ResultLabel, WindowAccumulator};
use crate::capture::Point;
use std::time::Duration;

/// `a / b`, or 0 when `b` is not positive or the quotient is not finite.
pub fn safe_div(a: f64, b: f64) -> f64 {
    if b > 0.0 {
        finite(a / b)
    } else {
        0.0
    }
}

fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len() as f64;
    safe_div(values.sum(), n)
}

/// Mean distance between consecutive clicks; 0 below two clicks.
fn click_spread(clicks: &[Point]) -> f64 {
    if clicks.len() < 2 {
        return 0.0;
    }
    mean(clicks.windows(2).map(|w| w[0].distance_to(&w[1])))
}

fn hold_range(holds: &[f64]) -> f64 {
    if holds.len() < 2 {
        return 0.0;
    }
    let (min, max) = holds
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| {
            (lo.min(h), hi.max(h))
        });
    finite(max - min)
}

pub struct FeatureComposer {
    label: ResultLabel,
}

impl FeatureComposer {
    pub fn new(label: ResultLabel) -> Self {
        Self { label }
    }

    pub fn compose(&self, window: &WindowAccumulator, elapsed: Duration) -> FeatureVector {
        let t = elapsed.as_secs_f64();
        let holds = &window.key_holds;
        let hold_avg = mean(holds.iter().copied());

        FeatureVector {
            mouse_path_length: finite(window.path_length),
            mouse_avg_speed: safe_div(window.path_length, t),
            mouse_max_speed: finite(window.max_speed),
            mouse_stops: window.stops,
            mouse_click_frequency: safe_div(window.clicks as f64, t),
            mouse_scroll_speed: safe_div(window.scroll_distance, t),
            mouse_scroll_direction_changes: window.scroll_direction_changes,
            avg_click_x: mean(window.click_positions.iter().map(|p| p.x)),
            avg_click_y: mean(window.click_positions.iter().map(|p| p.y)),
            click_spread: click_spread(&window.click_positions),
            typing_speed: safe_div(window.typing_count as f64, t),
            keypress_interval_avg: if holds.len() >= 2 { hold_avg } else { 0.0 },
            key_hold_duration_avg: hold_avg,
            special_key_usage: window.special_keys,
            error_corrections: window.error_corrections,
            pause_between_typing: hold_range(holds),
            interaction_duration: finite(t),
            response_time: window
                .response_latency_ms
                .map(|ms| finite(ms / 1000.0))
                .unwrap_or(0.0),
            result: self.label,
        }
    }
}
