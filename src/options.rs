use serde::{Deserialize, Serialize};

/// Options for a mapping session.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    /// Period of the tracking-point sampler in milliseconds (default: 20000)
    #[serde(default = "default_tracking_interval_ms")]
    pub tracking_interval_ms: u32,

    /// Draft store key for in-progress waypoints (default: "unsavedWaypoints")
    #[serde(default = "default_draft_key")]
    pub draft_key: String,

    /// Decimal places of the coordinates in a section summary (default: 5)
    #[serde(default = "default_coordinate_precision")]
    pub coordinate_precision: usize,

    /// Route name recorded in a summary when none was entered (default: "Unnamed Route")
    #[serde(default = "default_route_name")]
    pub default_route_name: String,

    /// GPX `creator` attribute (default: "RallyMapper")
    #[serde(default = "default_creator")]
    pub creator: String,

    #[serde(default = "default_true")]
    pub enable_high_accuracy: bool,

    /// Timeout for the continuous position watch (default: 15000)
    #[serde(default = "default_watch_timeout_ms")]
    pub watch_timeout_ms: u32,

    #[serde(default = "default_watch_maximum_age_ms")]
    pub watch_maximum_age_ms: u32,

    /// Timeout for a single tracking sample request (default: 10000)
    #[serde(default = "default_sample_timeout_ms")]
    pub sample_timeout_ms: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tracking_interval_ms: default_tracking_interval_ms(),
            draft_key: default_draft_key(),
            coordinate_precision: default_coordinate_precision(),
            default_route_name: default_route_name(),
            creator: default_creator(),
            enable_high_accuracy: true,
            watch_timeout_ms: default_watch_timeout_ms(),
            watch_maximum_age_ms: default_watch_maximum_age_ms(),
            sample_timeout_ms: default_sample_timeout_ms(),
        }
    }
}

/// Position request options handed to the JS geolocation API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_age: Option<u32>,
}

impl SessionOptions {
    pub fn watch_options(&self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout: self.watch_timeout_ms,
            maximum_age: Some(self.watch_maximum_age_ms),
        }
    }

    pub fn sample_options(&self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: self.enable_high_accuracy,
            timeout: self.sample_timeout_ms,
            maximum_age: None,
        }
    }
}

fn default_tracking_interval_ms() -> u32 {
    20_000
}

fn default_draft_key() -> String {
    "unsavedWaypoints".to_string()
}

fn default_coordinate_precision() -> usize {
    5
}

fn default_route_name() -> String {
    "Unnamed Route".to_string()
}

fn default_creator() -> String {
    "RallyMapper".to_string()
}

fn default_watch_timeout_ms() -> u32 {
    15_000
}

fn default_watch_maximum_age_ms() -> u32 {
    10_000
}

fn default_sample_timeout_ms() -> u32 {
    10_000
}

fn default_true() -> bool {
    true
}
