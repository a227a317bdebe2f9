//! Port traits — the hexagonal boundary between the player and the outside world.
//!
//! ```text
//!   FrameSource ──▶ Player (domain) ──▶ ActuatorPort
//!                         │
//!                         └──────────▶ EventSink
//! ```
//!
//! The frame-capture backend and the key-injection primitive are external
//! collaborators; they plug in by implementing these traits.  The
//! [`Player`](super::service::Player) consumes them via generics, so the
//! domain core never touches a screen or a keyboard directly.

use std::sync::Arc;

use crate::actuator::Channel;
use crate::error::Result;
use crate::window::RawFrame;

// ───────────────────────────────────────────────────────────────
// Frame source (driving adapter: capture → domain)
// ───────────────────────────────────────────────────────────────

/// Invoked once per captured frame, on the source's own thread.
pub type FrameCallback = Arc<dyn Fn(RawFrame) + Send + Sync + 'static>;

/// Push-style frame delivery.
pub trait FrameSource {
    /// Install the callback that receives every frame.  Replaces any
    /// previously registered callback.
    fn register(&mut self, callback: FrameCallback);

    /// Begin delivering frames.
    fn start(&mut self) -> Result<()>;

    /// Stop delivering frames.  When this returns no further callback
    /// invocation starts.
    fn stop(&mut self);
}

/// Pull-side capture primitive, for sources that poll a backend on a timer.
pub trait FrameGrabber: Send + 'static {
    /// Capture one frame, or `None` if nothing is available right now.
    fn grab(&mut self) -> Option<RawFrame>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → keys)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the four steering controls.
///
/// Fire-and-forget: no return value, no acknowledgement.  The player only
/// ever calls `press` on a released channel and `release` on a pressed one.
pub trait ActuatorPort: Send {
    fn press(&mut self, channel: Channel);

    fn release(&mut self, channel: Channel);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The player emits structured [`PlayerEvent`](super::events::PlayerEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink: Send {
    fn emit(&mut self, event: &super::events::PlayerEvent);
}
