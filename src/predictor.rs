//! Predictor — the opaque classifier behind a non-reentrant call guard.
//!
//! ```text
//!  WindowTensor ──▶ ┌──────────────────────────────┐ ──▶ ScoreVector
//!                   │ Predictor                    │
//!                   │  in-flight guard (1 slot)    │
//!                   │  InferenceEngine (opaque)    │
//!                   │  latency stats               │
//!                   └──────────────────────────────┘
//! ```
//!
//! The engine is not assumed reentrant.  A call that finds the slot taken
//! fails immediately with [`InferenceError::Busy`]; it never waits and never
//! queues.  Latency is recorded for observability only.

use core::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::info;

use crate::actuator::CHANNEL_COUNT;
use crate::error::InferenceError;
use crate::window::WindowTensor;

// ───────────────────────────────────────────────────────────────
// Engine seam
// ───────────────────────────────────────────────────────────────

/// The pretrained classifier, consumed as a black box.
///
/// Implementations receive the whole window and return the raw output
/// vector.  They are loaded once; per-call errors are reported through the
/// returned `Result`.
pub trait InferenceEngine: Send + Sync {
    fn run(&self, input: &WindowTensor) -> anyhow::Result<Vec<f32>>;
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn run(&self, input: &WindowTensor) -> anyhow::Result<Vec<f32>> {
        (**self).run(input)
    }
}

// ───────────────────────────────────────────────────────────────
// ScoreVector
// ───────────────────────────────────────────────────────────────

/// One continuous score per channel, in [`Channel`](crate::actuator::Channel) order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreVector([f32; CHANNEL_COUNT]);

impl ScoreVector {
    pub const fn new(scores: [f32; CHANNEL_COUNT]) -> Self {
        Self(scores)
    }

    pub fn values(&self) -> [f32; CHANNEL_COUNT] {
        self.0
    }
}

impl TryFrom<&[f32]> for ScoreVector {
    type Error = InferenceError;

    fn try_from(raw: &[f32]) -> Result<Self, Self::Error> {
        <[f32; CHANNEL_COUNT]>::try_from(raw)
            .map(Self)
            .map_err(|_| InferenceError::OutputShape {
                expected: CHANNEL_COUNT,
                actual: raw.len(),
            })
    }
}

impl fmt::Display for ScoreVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "[{a:.3}, {b:.3}, {c:.3}, {d:.3}]")
    }
}

// ───────────────────────────────────────────────────────────────
// Latency stats
// ───────────────────────────────────────────────────────────────

/// Lock-free wall-clock latency accumulator.
#[derive(Debug, Default)]
struct LatencyStats {
    last_nanos: AtomicU64,
    max_nanos: AtomicU64,
    total_nanos: AtomicU64,
    count: AtomicU64,
}

impl LatencyStats {
    fn record(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.last_nanos.store(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> LatencySnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let total = self.total_nanos.load(Ordering::Relaxed);
        LatencySnapshot {
            count,
            last: Duration::from_nanos(self.last_nanos.load(Ordering::Relaxed)),
            max: Duration::from_nanos(self.max_nanos.load(Ordering::Relaxed)),
            mean: Duration::from_nanos(total.checked_div(count).unwrap_or(0)),
        }
    }
}

/// Point-in-time view of completed inference latencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencySnapshot {
    pub count: u64,
    pub last: Duration,
    pub max: Duration,
    pub mean: Duration,
}

// ───────────────────────────────────────────────────────────────
// Predictor
// ───────────────────────────────────────────────────────────────

pub struct Predictor<E> {
    engine: E,
    in_flight: AtomicBool,
    latency: LatencyStats,
    log_latency: bool,
}

/// Exclusive hold on a predictor's single inference slot.
///
/// Callers that must keep later stages ordered behind an inference (e.g.
/// applying its decision) keep the slot alive until they are done.  The
/// slot frees itself on drop.
pub struct InferenceSlot<'a, E> {
    predictor: &'a Predictor<E>,
}

impl<E: InferenceEngine> InferenceSlot<'_, E> {
    /// Run the classifier over `window`.
    pub fn infer(&self, window: &WindowTensor) -> Result<ScoreVector, InferenceError> {
        let p = self.predictor;
        let started = Instant::now();
        let raw = p
            .engine
            .run(window)
            .map_err(|e| InferenceError::Engine(format!("{e:#}")))?;
        let elapsed = started.elapsed();

        p.latency.record(elapsed);
        if p.log_latency {
            info!("Inference time: {:.4}s", elapsed.as_secs_f64());
        }

        ScoreVector::try_from(raw.as_slice())
    }
}

impl<E> Drop for InferenceSlot<'_, E> {
    fn drop(&mut self) {
        self.predictor.in_flight.store(false, Ordering::Release);
    }
}

impl<E: InferenceEngine> Predictor<E> {
    /// Wrap an already-loaded engine.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            in_flight: AtomicBool::new(false),
            latency: LatencyStats::default(),
            log_latency: false,
        }
    }

    /// Log every inference latency at `info`.
    #[must_use]
    pub fn with_latency_logging(mut self, enabled: bool) -> Self {
        self.log_latency = enabled;
        self
    }

    /// Take the inference slot, or fail with [`InferenceError::Busy`] if it
    /// is held.  Never waits.
    pub fn reserve(&self) -> Result<InferenceSlot<'_, E>, InferenceError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| InferenceSlot { predictor: self })
            .map_err(|_| InferenceError::Busy)
    }

    /// Reserve the slot and run the classifier over `window`.
    ///
    /// Fails with [`InferenceError::Busy`] without touching the engine if
    /// another call on this predictor has not returned.
    pub fn infer(&self, window: &WindowTensor) -> Result<ScoreVector, InferenceError> {
        self.reserve()?.infer(window)
    }

    /// Whether the inference slot is held right now.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn latency(&self) -> LatencySnapshot {
        self.latency.snapshot()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}
