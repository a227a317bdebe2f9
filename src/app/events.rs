//! Outbound player events.
//!
//! The [`Player`](super::service::Player) and [`Session`](crate::session::Session)
//! emit these through the [`EventSink`](super::ports::EventSink) port.

use crate::actuator::Transition;
use crate::error::Error;

use super::service::StatsSnapshot;

/// Structured events emitted by the player core.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Frame delivery has started.
    Started,

    /// A steering key changed state.
    Transition(Transition),

    /// A fatal error ended processing on the frame callback.
    Fault(Error),

    /// Frame delivery has stopped and every key is released.
    Stopped(StatsSnapshot),
}
