//! Windowed behavioral features: per-window accumulation and vector composition.

mod accumulator;
mod composer;

pub use accumulator::{ScrollDirection, WindowAccumulator};
pub use composer::{safe_div, FeatureComposer};

use serde::{Deserialize, Serialize};

/// Label attached to each vector by the host. The engine never infers it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ResultLabel {
    #[default]
    Human,
    Bot,
}

impl From<ResultLabel> for u8 {
    fn from(label: ResultLabel) -> u8 {
        match label {
            ResultLabel::Human => 0,
            ResultLabel::Bot => 1,
        }
    }
}

impl TryFrom<u8> for ResultLabel {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ResultLabel::Human),
            1 => Ok(ResultLabel::Bot),
            other => Err(format!("result label must be 0 or 1, got {other}")),
        }
    }
}

/// One window's behavioral summary. Serializes with the classifier's literal
/// field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "Mouse_Path_Length")]
    pub mouse_path_length: f64,
    #[serde(rename = "Mouse_Avg_Speed")]
    pub mouse_avg_speed: f64,
    #[serde(rename = "Mouse_Max_Speed")]
    pub mouse_max_speed: f64,
    #[serde(rename = "Mouse_Stops")]
    pub mouse_stops: u32,
    #[serde(rename = "Mouse_Click_Frequency")]
    pub mouse_click_frequency: f64,
    #[serde(rename = "Mouse_Scroll_Speed")]
    pub mouse_scroll_speed: f64,
    #[serde(rename = "Mouse_Scroll_Direction_Changes")]
    pub mouse_scroll_direction_changes: u32,
    #[serde(rename = "Avg_Click_X")]
    pub avg_click_x: f64,
    #[serde(rename = "Avg_Click_Y")]
    pub avg_click_y: f64,
    #[serde(rename = "Click_Spread")]
    pub click_spread: f64,
    #[serde(rename = "Typing_Speed")]
    pub typing_speed: f64,
    #[serde(rename = "Keypress_Interval_Avg")]
    pub keypress_interval_avg: f64,
    #[serde(rename = "Key_Hold_Duration_Avg")]
    pub key_hold_duration_avg: f64,
    #[serde(rename = "Special_Key_Usage")]
    pub special_key_usage: u32,
    #[serde(rename = "Error_Corrections")]
    pub error_corrections: u32,
    #[serde(rename = "Pause_Between_Typing")]
    pub pause_between_typing: f64,
    #[serde(rename = "Interaction_Duration")]
    pub interaction_duration: f64,
    #[serde(rename = "Response_Time")]
    pub response_time: f64,
    #[serde(rename = "Result")]
    pub result: ResultLabel,
}

impl FeatureVector {
    pub const FIELD_NAMES: [&'static str; 19] = [
        "Mouse_Path_Length",
        "Mouse_Avg_Speed",
        "Mouse_Max_Speed",
        "Mouse_Stops",
        "Mouse_Click_Frequency",
        "Mouse_Scroll_Speed",
        "Mouse_Scroll_Direction_Changes",
        "Avg_Click_X",
        "Avg_Click_Y",
        "Click_Spread",
        "Typing_Speed",
        "Keypress_Interval_Avg",
        "Key_Hold_Duration_Avg",
        "Special_Key_Usage",
        "Error_Corrections",
        "Pause_Between_Typing",
        "Interaction_Duration",
        "Response_Time",
        "Result",
    ];

    /// Fixed-order numeric view, aligned with [`FeatureVector::FIELD_NAMES`].
    pub fn values(&self) -> [f64; 19] {
        [
            self.mouse_path_length,
            self.mouse_avg_speed,
            self.mouse_max_speed,
            self.mouse_stops as f64,
            self.mouse_click_frequency,
            self.mouse_scroll_speed,
            self.mouse_scroll_direction_changes as f64,
            self.avg_click_x,
            self.avg_click_y,
            self.click_spread,
            self.typing_speed,
            self.keypress_interval_avg,
            self.key_hold_duration_avg,
            self.special_key_usage as f64,
            self.error_corrections as f64,
            self.pause_between_typing,
            self.interaction_duration,
            self.response_time,
            u8::from(self.result) as f64,
        ]
    }
}
