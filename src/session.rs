//! Session — binds a frame source to a player for one run.
//!
//! ```text
//!  start()                          wait()                    stop()
//!    │ register callback ──▶ frames ──▶ Player.on_frame         │
//!    │ source.start()            │                              │ source.stop()
//!    └─ emit Started             └─ Err ─▶ StopSignal::fault    │ release_all()
//!                                                               └─ emit Stopped
//! ```
//!
//! A run ends when someone calls [`StopSignal::request_stop`] or when the
//! frame callback hits a non-transient error.  Either way the waiter is
//! woken through one [`Signal`]; nothing polls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{error, info};

use crate::app::events::PlayerEvent;
use crate::app::ports::{ActuatorPort, EventSink, FrameCallback, FrameSource};
use crate::app::service::{Player, StatsSnapshot};
use crate::error::{Error, Result};
use crate::model::ActionModel;
use crate::window::RawFrame;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    /// [`StopSignal::request_stop`] was called.
    Requested,
    /// The frame callback failed with a non-transient error.
    Fault(Error),
}

// ───────────────────────────────────────────────────────────────
// Stop signal
// ───────────────────────────────────────────────────────────────

/// Cross-thread end-of-session notification.
///
/// The first end wins; later stop requests or faults are ignored until the
/// signal is re-armed by [`Session::stop`].  A stop requested before the
/// session starts ends its next run immediately.
pub struct StopSignal {
    signal: Signal<CriticalSectionRawMutex, SessionEnd>,
    ended: AtomicBool,
}

impl StopSignal {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
            ended: AtomicBool::new(false),
        }
    }

    /// Ask the session to end.  Callable from any thread.
    pub fn request_stop(&self) {
        self.end(SessionEnd::Requested);
    }

    /// End the session because of `err`.
    pub fn fault(&self, err: Error) {
        self.end(SessionEnd::Fault(err));
    }

    /// Whether the session has been asked to end.
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    /// Block the calling thread until the session ends.
    pub fn wait(&self) -> SessionEnd {
        futures_lite::future::block_on(self.signal.wait())
    }

    fn end(&self, reason: SessionEnd) {
        if self
            .ended
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.signal.signal(reason);
        }
    }

    fn rearm(&self) {
        self.signal.reset();
        self.ended.store(false, Ordering::Release);
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Session
// ───────────────────────────────────────────────────────────────

pub struct Session<S, M, A, E>
where
    S: FrameSource,
    M: ActionModel + 'static,
    A: ActuatorPort + 'static,
    E: EventSink + 'static,
{
    source: S,
    player: Arc<Player<M, A, E>>,
    signal: Arc<StopSignal>,
    running: bool,
}

impl<S, M, A, E> Session<S, M, A, E>
where
    S: FrameSource,
    M: ActionModel + 'static,
    A: ActuatorPort + 'static,
    E: EventSink + 'static,
{
    pub fn new(source: S, player: Player<M, A, E>) -> Self {
        Self {
            source,
            player: Arc::new(player),
            signal: Arc::new(StopSignal::new()),
            running: false,
        }
    }

    /// Register the frame callback and start delivery.  No-op if running.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }

        let player = Arc::clone(&self.player);
        let signal = Arc::clone(&self.signal);
        let callback: FrameCallback = Arc::new(move |frame: RawFrame| {
            if signal.is_ended() {
                return;
            }
            if let Err(e) = player.on_frame(&frame) {
                error!("SESSION | frame processing failed: {e}");
                player.emit(&PlayerEvent::Fault(e.clone()));
                signal.fault(e);
            }
        });
        self.source.register(callback);

        self.source.start()?;
        self.running = true;
        info!("SESSION | started");
        self.player.emit(&PlayerEvent::Started);
        Ok(())
    }

    /// Stop delivery, release every held key and re-arm the stop signal for
    /// the next run.  Does not wake a thread blocked in [`wait`](Self::wait);
    /// use [`StopSignal::request_stop`] for that.
    pub fn stop(&mut self) -> StatsSnapshot {
        if self.running {
            self.source.stop();
            self.running = false;
            self.player.release_all();
            let stats = self.player.stats();
            info!(
                "SESSION | stopped | frames={} predictions={} busy={} failures={}",
                stats.frames_received, stats.predictions, stats.dropped_busy, stats.engine_failures
            );
            self.player.emit(&PlayerEvent::Stopped(stats));
        }
        // Only after delivery has stopped, so a late fault cannot leak
        // into the next run.
        self.signal.rearm();
        self.player.stats()
    }

    /// Handle for ending the session from another thread.
    pub fn stop_handle(&self) -> Arc<StopSignal> {
        Arc::clone(&self.signal)
    }

    /// Block until the session is asked to end.  Does not stop delivery.
    pub fn wait(&self) -> SessionEnd {
        self.signal.wait()
    }

    /// Start, block until the session ends, then stop.
    ///
    /// Returns the final stats on a requested stop and the error on a fault.
    pub fn run_until_stopped(&mut self) -> Result<StatsSnapshot> {
        self.start()?;
        let end = self.wait();
        let stats = self.stop();
        match end {
            SessionEnd::Requested => Ok(stats),
            SessionEnd::Fault(e) => Err(e),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn player(&self) -> &Player<M, A, E> {
        &self.player
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S, M, A, E> Drop for Session<S, M, A, E>
where
    S: FrameSource,
    M: ActionModel + 'static,
    A: ActuatorPort + 'static,
    E: EventSink + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}
