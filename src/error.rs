//! Unified error types for the frame player.
//!
//! A single `Error` enum that every subsystem converts into, so the frame
//! callback and the session driver handle failures uniformly.  Errors fall
//! into three families:
//!
//! - **Configuration** ([`ConfigError`]): bad thresholds, shape mismatches,
//!   missing model files.  Fatal at construction or first validation.
//! - **Inference** ([`InferenceError`]): per-call failures of the opaque
//!   classifier.  Only the transient kinds are absorbed by the player.
//! - **Model load**: the engine could not build a runnable model.  Fatal,
//!   never retried inside the crate.

use core::fmt;
use std::path::PathBuf;

use crate::window::FrameShape;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration is invalid or disagrees with observed data.
    Config(ConfigError),
    /// An inference call failed in a way the caller must see.
    Inference(InferenceError),
    /// The model artifact exists but could not be turned into a runnable model.
    ModelLoad(String),
    /// The frame source could not be started.
    Capture(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Inference(e) => write!(f, "inference: {e}"),
            Self::ModelLoad(msg) => write!(f, "model load: {msg}"),
            Self::Capture(msg) => write!(f, "capture: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` names the field and the rule.
    ValidationFailed(&'static str),
    /// The configured model artifact does not exist.
    ModelNotFound(PathBuf),
    /// A frame arrived whose shape differs from the configured per-frame shape.
    FrameShapeMismatch {
        expected: FrameShape,
        actual: FrameShape,
    },
    /// The model's static output shape does not yield one score per channel.
    ModelOutputShape { expected: usize, actual: usize },
    /// Config file could not be read.
    Io(String),
    /// Config file is not valid JSON for [`PlayerConfig`](crate::config::PlayerConfig).
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::ModelNotFound(path) => write!(f, "model not found at {}", path.display()),
            Self::FrameShapeMismatch { expected, actual } => {
                write!(f, "frame shape {actual} does not match configured {expected}")
            }
            Self::ModelOutputShape { expected, actual } => {
                write!(f, "model yields {actual} outputs, expected {expected}")
            }
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Inference errors
// ---------------------------------------------------------------------------

/// Failure of a single [`Predictor::infer`](crate::predictor::Predictor::infer) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// Another invocation on the same predictor has not returned yet.
    Busy,
    /// The engine reported a runtime failure for this input.
    Engine(String),
    /// The engine returned the wrong number of scores.
    OutputShape { expected: usize, actual: usize },
}

impl InferenceError {
    /// Transient errors cost one frame's prediction and nothing else.
    /// Anything else is a defect in the model wrapper and must surface.
    /// Engine failures are transient only up to
    /// `max_consecutive_engine_failures` in a row.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy | Self::Engine(_))
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "previous inference still in flight"),
            Self::Engine(msg) => write!(f, "engine failure: {msg}"),
            Self::OutputShape { expected, actual } => {
                write!(f, "engine returned {actual} scores, expected {expected}")
            }
        }
    }
}

impl From<InferenceError> for Error {
    fn from(e: InferenceError) -> Self {
        Self::Inference(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
