//! Timer-driven frame source.
//!
//! Implements [`FrameSource`] on top of any [`FrameGrabber`]: a named
//! worker thread grabs one frame per tick and hands it to the registered
//! callback.  Ticks that arrive while the callback is still running are
//! coalesced, so a slow consumer lowers the effective rate instead of
//! building a backlog.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, bounded, select, tick};
use log::{error, info, warn};

use crate::app::ports::{FrameCallback, FrameGrabber, FrameSource};
use crate::config::PlayerConfig;
use crate::error::{Error, Result};

struct Worker<G> {
    stop_tx: Sender<()>,
    handle: JoinHandle<G>,
}

pub struct IntervalFrameSource<G: FrameGrabber> {
    grabber: Option<G>,
    interval: Duration,
    callback: Option<FrameCallback>,
    worker: Option<Worker<G>>,
}

impl<G: FrameGrabber> IntervalFrameSource<G> {
    pub fn new(grabber: G, interval: Duration) -> Self {
        Self {
            grabber: Some(grabber),
            interval,
            callback: None,
            worker: None,
        }
    }

    /// Tick at `config.capture.frames_per_second`.
    pub fn from_config(grabber: G, config: &PlayerConfig) -> Self {
        Self::new(grabber, config.frame_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// The grabber, while the worker is not holding it.
    pub fn grabber(&self) -> Option<&G> {
        self.grabber.as_ref()
    }
}

impl<G: FrameGrabber> FrameSource for IntervalFrameSource<G> {
    fn register(&mut self, callback: FrameCallback) {
        self.callback = Some(callback);
    }

    fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        let callback = self
            .callback
            .clone()
            .ok_or_else(|| Error::Capture("no frame callback registered".into()))?;
        let mut grabber = self
            .grabber
            .take()
            .ok_or_else(|| Error::Capture("frame grabber lost by a failed worker".into()))?;

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let ticker = tick(self.interval);
        let handle = thread::Builder::new()
            .name("frame-source".into())
            .spawn(move || {
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            if let Some(frame) = grabber.grab() {
                                callback(frame);
                            }
                        }
                    }
                }
                grabber
            })
            .map_err(|e| Error::Capture(format!("spawn frame-source: {e}")))?;

        info!("CAPTURE | started, interval={:?}", self.interval);
        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    /// Blocks until an in-progress callback returns.  Must not be called
    /// from inside the callback.
    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.handle.thread().id() == thread::current().id() {
            warn!("CAPTURE | stop called from the frame callback, not joining");
            let _ = worker.stop_tx.send(());
            return;
        }
        let _ = worker.stop_tx.send(());
        match worker.handle.join() {
            Ok(grabber) => self.grabber = Some(grabber),
            Err(_) => error!("CAPTURE | worker panicked, grabber dropped"),
        }
        info!("CAPTURE | stopped");
    }
}

impl<G: FrameGrabber> Drop for IntervalFrameSource<G> {
    fn drop(&mut self) {
        self.stop();
    }
}
