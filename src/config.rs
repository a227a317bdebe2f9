//! Player configuration parameters
//!
//! All tunable parameters for the frame player.  Loaded from a JSON file
//! or built in code; either way [`PlayerConfig::validate`] runs before any
//! component is constructed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::window::FrameShape;

/// Upper bound on `window_length × height × width × channels` (f32 values
/// held by one window, 4 GiB).
pub const MAX_WINDOW_VALUES: usize = 1 << 30;

/// Core player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    // --- Model ---
    /// Serialized classifier (ONNX).
    pub model_path: PathBuf,
    /// Frames per model input (N).
    pub window_length: usize,
    /// Per-frame height × width × channels.
    pub frame: FrameShape,

    // --- Decision ---
    /// Score above which a channel is considered on, strictly inside (0, 1).
    pub activation_threshold: f32,
    /// Scale samples to [0, 1] before they enter the window.
    pub normalize_images: bool,
    /// Engine failures in a row tolerated as skipped frames; the next one
    /// is raised as an error.
    pub max_consecutive_engine_failures: u32,

    // --- Instrumentation ---
    /// Log raw and binarized predictions.
    pub print_prediction: bool,
    /// Log wall-clock latency of every inference.
    pub print_inference_time: bool,

    // --- Capture ---
    pub capture: CaptureConfig,
}

/// Settings handed to the frame source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frame delivery rate.
    pub frames_per_second: u32,
    /// Side length of the square capture region (pixels).
    pub frame_size: usize,
    /// Centre of the capture region in screen coordinates; `None` until picked.
    pub frame_center: Option<(f32, f32)>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            // Model
            model_path: PathBuf::from("model.onnx"),
            window_length: 20,
            frame: FrameShape::new(256, 256, 3),

            // Decision
            activation_threshold: 0.5,
            normalize_images: true,
            max_consecutive_engine_failures: 5,

            // Instrumentation
            print_prediction: false,
            print_inference_time: false,

            capture: CaptureConfig::default(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 10,
            frame_size: 256,
            frame_center: None,
        }
    }
}

impl PlayerConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot work.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_length == 0 {
            return Err(ConfigError::ValidationFailed("window_length must be > 0"));
        }
        if self.frame.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "frame height, width and channels must be > 0",
            ));
        }
        let window_values = self
            .frame
            .checked_len()
            .and_then(|n| n.checked_mul(self.window_length));
        if !window_values.is_some_and(|n| n <= MAX_WINDOW_VALUES) {
            return Err(ConfigError::ValidationFailed(
                "window_length × frame size exceeds MAX_WINDOW_VALUES",
            ));
        }
        // Negated so NaN fails too.
        if !(self.activation_threshold > 0.0 && self.activation_threshold < 1.0) {
            return Err(ConfigError::ValidationFailed(
                "activation_threshold must be strictly between 0 and 1",
            ));
        }
        if self.max_consecutive_engine_failures == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_consecutive_engine_failures must be > 0",
            ));
        }
        if self.capture.frames_per_second == 0 {
            return Err(ConfigError::ValidationFailed(
                "capture.frames_per_second must be > 0",
            ));
        }
        if self.capture.frame_size != self.frame.height
            || self.capture.frame_size != self.frame.width
        {
            return Err(ConfigError::ValidationFailed(
                "capture.frame_size must equal frame height and width",
            ));
        }
        Ok(())
    }

    /// Model input dimensions without the batch axis: `[N, H, W, C]`.
    pub fn model_input_dims(&self) -> [usize; 4] {
        [
            self.window_length,
            self.frame.height,
            self.frame.width,
            self.frame.channels,
        ]
    }

    /// Time between frame deliveries.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.capture.frames_per_second.max(1)
    }
}
