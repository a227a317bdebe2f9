//! Action models — frames in, steering decisions out.
//!
//! An [`ActionModel`] takes one frame per call and, when it manages to make
//! a prediction, hands the thresholded decision to a [`PredictionDelegate`].
//! [`SingleActionModel`] is the classifier-backed variant: one rolling
//! window, one predictor, one threshold.
//!
//! ```text
//!  RawFrame ─▶ FrameWindow.feed ─▶ snapshot ─▶ Predictor.infer ─▶ binarize ─▶ delegate
//!                 (always)                       (may be skipped)
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::config::PlayerConfig;
use crate::error::Result;
use crate::predictor::{InferenceEngine, Predictor};
use crate::threshold::{BinaryVector, binarize};
use crate::window::{FrameWindow, RawFrame, WindowTensor};

// ───────────────────────────────────────────────────────────────
// Capability
// ───────────────────────────────────────────────────────────────

/// Receives every prediction a model makes.
pub trait PredictionDelegate {
    fn on_prediction_made(&self, prediction: &BinaryVector);
}

/// Why a frame produced no prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An earlier inference was still running.
    Busy,
    /// The engine failed on this input.
    EngineFailure,
}

/// Result of feeding one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// The delegate received this decision.
    Predicted(BinaryVector),
    /// The frame entered the window but was not predicted on.
    Skipped(SkipReason),
}

/// A model that consumes frames and reports decisions to a delegate.
///
/// `feed` may be called concurrently from the frame source's context.
/// `Err` means a non-transient failure the caller must act on.
pub trait ActionModel: Send + Sync {
    fn feed(&self, frame: &RawFrame, delegate: &dyn PredictionDelegate) -> Result<FeedOutcome>;
}

// ───────────────────────────────────────────────────────────────
// SingleActionModel
// ───────────────────────────────────────────────────────────────

pub struct SingleActionModel<E> {
    window: Mutex<FrameWindow>,
    predictor: Predictor<E>,
    threshold: f32,
    print_prediction: bool,
    failure_limit: u32,
    consecutive_failures: AtomicU32,
}

impl<E: InferenceEngine> SingleActionModel<E> {
    /// Build around an already-loaded engine.  Validates `config` first.
    pub fn new(config: &PlayerConfig, engine: E) -> Result<Self> {
        config.validate()?;
        Self::build(config, engine)
    }

    /// Assumes `config` has been validated.
    fn build(config: &PlayerConfig, engine: E) -> Result<Self> {
        let window = FrameWindow::new(config.window_length, config.frame, config.normalize_images)?;
        Ok(Self {
            window: Mutex::new(window),
            predictor: Predictor::new(engine).with_latency_logging(config.print_inference_time),
            threshold: config.activation_threshold,
            print_prediction: config.print_prediction,
            failure_limit: config.max_consecutive_engine_failures,
            consecutive_failures: AtomicU32::new(0),
        })
    }

    pub fn predictor(&self) -> &Predictor<E> {
        &self.predictor
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Copy of the current window contents.
    pub fn window_snapshot(&self) -> WindowTensor {
        self.window.lock().snapshot()
    }
}

#[cfg(feature = "onnx")]
impl SingleActionModel<crate::adapters::tract_engine::TractEngine> {
    /// Load the configured ONNX model and build the model around it.
    ///
    /// The config is validated once, before the model file is touched.
    pub fn load(config: &PlayerConfig) -> Result<Self> {
        config.validate()?;
        let engine = crate::adapters::tract_engine::TractEngine::load(config)?;
        Self::build(config, engine)
    }
}

impl<E: InferenceEngine> ActionModel for SingleActionModel<E> {
    fn feed(&self, frame: &RawFrame, delegate: &dyn PredictionDelegate) -> Result<FeedOutcome> {
        // Feed, snapshot and slot reservation happen under one lock, so the
        // slot is always taken in feed order.  Inference runs unlocked.
        let (input, slot) = {
            let mut window = self.window.lock();
            window.feed(frame)?;
            match self.predictor.reserve() {
                Ok(slot) => (window.snapshot(), slot),
                Err(_) => {
                    debug!("PRED | skipped, previous inference in flight");
                    return Ok(FeedOutcome::Skipped(SkipReason::Busy));
                }
            }
        };

        // Counter updates are serialized by the slot.
        let scores = match slot.infer(&input) {
            Ok(scores) => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
                scores
            }
            Err(e) if e.is_transient() => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                if failures > self.failure_limit {
                    error!("PRED | {failures} engine failures in a row, giving up: {e}");
                    self.consecutive_failures.store(0, Ordering::Relaxed);
                    return Err(e.into());
                }
                warn!("PRED | skipped ({failures}/{}), {e}", self.failure_limit);
                return Ok(FeedOutcome::Skipped(SkipReason::EngineFailure));
            }
            Err(e) => return Err(e.into()),
        };

        let prediction = binarize(&scores, self.threshold);
        if self.print_prediction {
            info!("PRED | raw={scores} bin={prediction}");
        }

        delegate.on_prediction_made(&prediction);
        drop(slot);
        Ok(FeedOutcome::Predicted(prediction))
    }
}
