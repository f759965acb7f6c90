//! Configuration loading.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Top-level configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ArConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Marker tracker settings.
#[derive(Clone, Debug, Deserialize)]
pub struct TrackerConfig {
    /// Frames buffered between the camera producer and the tracking thread (default: 2)
    #[serde(default = "default_frame_queue_capacity")]
    pub frame_queue_capacity: usize,

    /// How long the tracking thread waits for a frame before re-checking
    /// for a stop request, in milliseconds (default: 50, minimum: 1)
    #[serde(default = "default_frame_poll_interval_ms")]
    pub frame_poll_interval_ms: u64,

    /// Maximum number of live markers per tracker (default: 512)
    #[serde(default = "default_max_markers")]
    pub max_markers: usize,

    /// Detections below this confidence are not reported (default: 0.0)
    #[serde(default = "default_min_detection_confidence")]
    pub min_detection_confidence: f32,

    /// Name given to the tracking thread (default: "marker-tracker")
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

/// Logging settings for binaries.
#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Lower bound on the frame poll interval. A zero timeout would spin the
/// tracking thread while no frames arrive.
const MIN_FRAME_POLL_INTERVAL_MS: u64 = 1;

impl TrackerConfig {
    pub fn frame_poll_interval(&self) -> Duration {
        Duration::from_millis(self.frame_poll_interval_ms.max(MIN_FRAME_POLL_INTERVAL_MS))
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            frame_queue_capacity: default_frame_queue_capacity(),
            frame_poll_interval_ms: default_frame_poll_interval_ms(),
            max_markers: default_max_markers(),
            min_detection_confidence: default_min_detection_confidence(),
            thread_name: default_thread_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_frame_queue_capacity() -> usize {
    2
}
fn default_frame_poll_interval_ms() -> u64 {
    50
}
fn default_max_markers() -> usize {
    512
}
fn default_min_detection_confidence() -> f32 {
    0.0
}
fn default_thread_name() -> String {
    "marker-tracker".to_string()
}
fn default_log_filter() -> String {
    "rust_artrack=info".to_string()
}

impl ArConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ArConfig = toml::from_str(contents)?;
        Ok(config)
    }
}
