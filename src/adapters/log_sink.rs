//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing player events through the `log`
//! facade.  A telemetry or overlay adapter would implement the same trait.

use log::{error, info};

use crate::app::events::PlayerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`PlayerEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &PlayerEvent) {
        match event {
            PlayerEvent::Started => info!("START | frame delivery running"),
            PlayerEvent::Transition(t) => info!("KEYS  | {t}"),
            PlayerEvent::Fault(e) => error!("FAULT | {e}"),
            PlayerEvent::Stopped(s) => info!(
                "STOP  | frames={} predictions={} dropped_busy={} engine_failures={} transitions={}",
                s.frames_received, s.predictions, s.dropped_busy, s.engine_failures, s.transitions,
            ),
        }
    }
}
