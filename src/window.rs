//! Rolling frame window.
//!
//! Holds exactly `N` preprocessed frames, oldest first.  Every fed frame
//! evicts the oldest one, so the window always contains the `N` most
//! recent frames in arrival order.  Starts zero-filled.
//!
//! Frames are immutable and reference-counted: taking a [`WindowTensor`]
//! snapshot clones `N` pointers, not `N` images, so the window lock is held
//! only for the append and the snapshot, never across inference.

use core::fmt;
use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// Per-frame dimensions: height × width × channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl FrameShape {
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Number of scalar values in one frame, or `None` if it overflows.
    pub const fn checked_len(&self) -> Option<usize> {
        match self.height.checked_mul(self.width) {
            Some(hw) => hw.checked_mul(self.channels),
            None => None,
        }
    }

    /// Number of scalar values in one frame.  Saturates; shapes that
    /// overflow are rejected by config validation.
    pub const fn len(&self) -> usize {
        match self.checked_len() {
            Some(n) => n,
            None => usize::MAX,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0 || self.channels == 0
    }
}

impl fmt::Display for FrameShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

// ---------------------------------------------------------------------------
// Raw and preprocessed frames
// ---------------------------------------------------------------------------

/// A captured image as delivered by the frame source, 8 bits per sample,
/// row-major `height × width × channels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    shape: FrameShape,
    pixels: Vec<u8>,
}

impl RawFrame {
    /// Wrap a pixel buffer.  The buffer length must match the shape.
    pub fn new(shape: FrameShape, pixels: Vec<u8>) -> Result<Self, ConfigError> {
        if pixels.len() != shape.len() {
            return Err(ConfigError::ValidationFailed(
                "raw frame pixel count does not match its shape",
            ));
        }
        Ok(Self { shape, pixels })
    }

    /// A frame with every sample set to `value`.
    pub fn filled(shape: FrameShape, value: u8) -> Self {
        Self {
            shape,
            pixels: vec![value; shape.len()],
        }
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// A preprocessed frame: `f32` samples, raw-scale or normalised to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    shape: FrameShape,
    values: Arc<[f32]>,
}

impl Frame {
    pub fn zeros(shape: FrameShape) -> Self {
        Self {
            shape,
            values: vec![0.0; shape.len()].into(),
        }
    }

    /// Convert a raw frame, dividing by the largest representable sample
    /// value when `normalize` is set.
    pub fn from_raw(raw: &RawFrame, normalize: bool) -> Self {
        let scale = if normalize { f32::from(u8::MAX) } else { 1.0 };
        Self {
            shape: raw.shape,
            values: raw.pixels.iter().map(|&p| f32::from(p) / scale).collect(),
        }
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// FrameWindow
// ---------------------------------------------------------------------------

/// Fixed-length rolling buffer of the most recent preprocessed frames.
#[derive(Debug, Clone)]
pub struct FrameWindow {
    shape: FrameShape,
    normalize: bool,
    frames: VecDeque<Frame>,
}

impl FrameWindow {
    /// Build a zero-filled window of `length` frames.
    pub fn new(length: usize, shape: FrameShape, normalize: bool) -> Result<Self, ConfigError> {
        if length == 0 {
            return Err(ConfigError::ValidationFailed("window_length must be > 0"));
        }
        if shape.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "frame height, width and channels must be > 0",
            ));
        }
        if shape.checked_len().is_none() {
            return Err(ConfigError::ValidationFailed("frame dimensions overflow"));
        }
        // All initial slots share one zero buffer.
        let zero = Frame::zeros(shape);
        Ok(Self {
            shape,
            normalize,
            frames: std::iter::repeat_n(zero, length).collect(),
        })
    }

    /// Preprocess `raw` and append it as the newest frame, evicting the oldest.
    ///
    /// A shape mismatch is rejected before anything is touched.
    pub fn feed(&mut self, raw: &RawFrame) -> Result<(), ConfigError> {
        if raw.shape() != self.shape {
            return Err(ConfigError::FrameShapeMismatch {
                expected: self.shape,
                actual: raw.shape(),
            });
        }
        let frame = Frame::from_raw(raw, self.normalize);
        self.frames.pop_front();
        self.frames.push_back(frame);
        Ok(())
    }

    /// Number of frames held.  Always the configured length.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    /// Frames oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn newest(&self) -> Option<&Frame> {
        self.frames.back()
    }

    /// Cheap point-in-time copy for handing to the predictor.
    pub fn snapshot(&self) -> WindowTensor {
        WindowTensor {
            shape: self.shape,
            frames: self.frames.iter().cloned().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// WindowTensor
// ---------------------------------------------------------------------------

/// Immutable snapshot of a [`FrameWindow`], laid out for the model as
/// `[sequence_length, height, width, channels]`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTensor {
    shape: FrameShape,
    frames: Vec<Frame>,
}

impl WindowTensor {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// `[N, H, W, C]`.
    pub fn dims(&self) -> [usize; 4] {
        [
            self.frames.len(),
            self.shape.height,
            self.shape.width,
            self.shape.channels,
        ]
    }

    /// `[1, N, H, W, C]` — the implicit batch of one the model expects.
    pub fn batched_dims(&self) -> [usize; 5] {
        let [n, h, w, c] = self.dims();
        [1, n, h, w, c]
    }

    /// Flatten into one contiguous buffer, oldest frame first.
    pub fn to_vec(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.frames.len() * self.shape.len());
        for frame in &self.frames {
            out.extend_from_slice(frame.values());
        }
        out
    }
}
