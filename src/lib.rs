//! framepilot — drive four steering keys from a frame-window classifier.
//!
//! Frames arrive from a [`FrameSource`], roll through a fixed-length
//! [`FrameWindow`], and each window is scored by an opaque classifier.
//! Scores above the activation threshold become key presses; only changes
//! against the current key state reach the [`ActuatorPort`].

#![deny(unused_must_use)]

pub mod actuator;
pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod predictor;
pub mod session;
pub mod threshold;
pub mod window;

pub use actuator::{ActuatorStateController, Channel, KeyState, Transition, TransitionKind};
pub use app::events::PlayerEvent;
pub use app::ports::{ActuatorPort, EventSink, FrameCallback, FrameGrabber, FrameSource};
pub use app::service::{Player, StatsSnapshot};
pub use config::{CaptureConfig, PlayerConfig};
pub use error::{ConfigError, Error, InferenceError, Result};
pub use model::{ActionModel, FeedOutcome, PredictionDelegate, SingleActionModel, SkipReason};
pub use predictor::{InferenceEngine, Predictor, ScoreVector};
pub use session::{Session, SessionEnd, StopSignal};
pub use threshold::{BinaryVector, binarize};
pub use window::{FrameShape, FrameWindow, RawFrame, WindowTensor};
