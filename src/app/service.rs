//! Player — the hexagonal core.
//!
//! [`Player`] owns the action model and the edge-triggered key state.  It is
//! driven once per frame by [`Player::on_frame`], which may be invoked from
//! the frame source's thread while an earlier frame is still being
//! predicted.
//!
//! ```text
//!  FrameSource ──▶ ┌──────────────────────────────────┐ ──▶ ActuatorPort
//!                  │             Player               │
//!                  │  ActionModel · KeyState · Stats  │ ──▶ EventSink
//!                  └──────────────────────────────────┘
//! ```
//!
//! ## Locking
//!
//! - The model guards its own window; that lock is never held across
//!   inference.
//! - Key state, actuator port and event sink sit behind one lock, so each
//!   decision is compared and dispatched as a single snapshot.
//! - Overlap is rejected inside the predictor, not queued here.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};
use parking_lot::Mutex;
use serde::Serialize;

use crate::actuator::{ActuatorStateController, Channel, KeyState, TransitionKind, Transitions};
use crate::error::Result;
use crate::model::{ActionModel, FeedOutcome, PredictionDelegate, SkipReason};
use crate::threshold::BinaryVector;
use crate::window::RawFrame;

use super::events::PlayerEvent;
use super::ports::{ActuatorPort, EventSink};

// ───────────────────────────────────────────────────────────────
// Statistics
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct PlayerStats {
    frames_received: AtomicU64,
    predictions: AtomicU64,
    dropped_busy: AtomicU64,
    engine_failures: AtomicU64,
    transitions: AtomicU64,
}

/// Counters since the player was built.  Observational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub frames_received: u64,
    pub predictions: u64,
    /// Frames whose prediction was dropped because inference was in flight.
    pub dropped_busy: u64,
    pub engine_failures: u64,
    pub transitions: u64,
}

impl PlayerStats {
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            predictions: self.predictions.load(Ordering::Relaxed),
            dropped_busy: self.dropped_busy.load(Ordering::Relaxed),
            engine_failures: self.engine_failures.load(Ordering::Relaxed),
            transitions: self.transitions.load(Ordering::Relaxed),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Player
// ───────────────────────────────────────────────────────────────

/// Key state plus everything a transition is written to.
struct Actuation<A, E> {
    keys: ActuatorStateController,
    port: A,
    sink: E,
}

impl<A: ActuatorPort, E: EventSink> Actuation<A, E> {
    fn dispatch(&mut self, transitions: &Transitions) {
        for t in transitions {
            match t.kind {
                TransitionKind::Press => self.port.press(t.channel),
                TransitionKind::Release => self.port.release(t.channel),
            }
            self.sink.emit(&PlayerEvent::Transition(*t));
        }
    }
}

/// The perception-to-actuation loop.
pub struct Player<M, A, E> {
    model: M,
    actuation: Mutex<Actuation<A, E>>,
    stats: PlayerStats,
}

impl<M, A, E> Player<M, A, E>
where
    M: ActionModel,
    A: ActuatorPort,
    E: EventSink,
{
    /// All keys start released.
    pub fn new(model: M, port: A, sink: E) -> Self {
        Self {
            model,
            actuation: Mutex::new(Actuation {
                keys: ActuatorStateController::new(),
                port,
                sink,
            }),
            stats: PlayerStats::default(),
        }
    }

    // ── Per-frame orchestration ───────────────────────────────

    /// Run one frame through the pipeline.
    ///
    /// Transient inference failures come back as `Ok(Skipped(_))` with key
    /// state untouched.  `Err` is a configuration error or model defect.
    pub fn on_frame(&self, frame: &RawFrame) -> Result<FeedOutcome> {
        self.stats.frames_received.fetch_add(1, Ordering::Relaxed);

        let outcome = self.model.feed(frame, self)?;
        match outcome {
            FeedOutcome::Predicted(_) => {
                self.stats.predictions.fetch_add(1, Ordering::Relaxed);
            }
            FeedOutcome::Skipped(SkipReason::Busy) => {
                self.stats.dropped_busy.fetch_add(1, Ordering::Relaxed);
            }
            FeedOutcome::Skipped(SkipReason::EngineFailure) => {
                self.stats.engine_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(outcome)
    }

    // ── Lifecycle helpers ─────────────────────────────────────

    /// Release every pressed key.  Returns how many were released.
    pub fn release_all(&self) -> usize {
        let mut act = self.actuation.lock();
        let transitions = act.keys.release_all();
        act.dispatch(&transitions);
        self.stats
            .transitions
            .fetch_add(transitions.len() as u64, Ordering::Relaxed);
        if !transitions.is_empty() {
            info!("KEYS | released {} held key(s)", transitions.len());
        }
        transitions.len()
    }

    /// Forward an event to the sink.
    pub fn emit(&self, event: &PlayerEvent) {
        self.actuation.lock().sink.emit(event);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn key_state(&self, channel: Channel) -> KeyState {
        self.actuation.lock().keys.state(channel)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run `f` against the actuator port (e.g. to inspect a test double).
    pub fn with_port<R>(&self, f: impl FnOnce(&A) -> R) -> R {
        f(&self.actuation.lock().port)
    }

    /// Run `f` against the event sink.
    pub fn with_sink<R>(&self, f: impl FnOnce(&E) -> R) -> R {
        f(&self.actuation.lock().sink)
    }
}

impl<M, A, E> PredictionDelegate for Player<M, A, E>
where
    A: ActuatorPort,
    E: EventSink,
{
    fn on_prediction_made(&self, prediction: &BinaryVector) {
        let mut act = self.actuation.lock();
        let transitions = act.keys.apply(prediction);
        if transitions.is_empty() {
            return;
        }
        debug!("KEYS | {prediction} -> {} transition(s)", transitions.len());
        act.dispatch(&transitions);
        self.stats
            .transitions
            .fetch_add(transitions.len() as u64, Ordering::Relaxed);
    }
}
