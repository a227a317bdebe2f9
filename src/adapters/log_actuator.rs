//! Dry-run actuator.
//!
//! Implements [`ActuatorPort`] by logging each key change instead of
//! injecting it, so a model can be watched steering without touching the
//! keyboard.  A real key-injection backend implements the same trait.

use log::info;

use crate::actuator::Channel;
use crate::app::ports::ActuatorPort;

#[derive(Debug, Default)]
pub struct LogActuator {
    presses: u64,
    releases: u64,
}

impl LogActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(presses, releases)` issued so far.
    pub fn counts(&self) -> (u64, u64) {
        (self.presses, self.releases)
    }
}

impl ActuatorPort for LogActuator {
    fn press(&mut self, channel: Channel) {
        self.presses += 1;
        info!("KEYS | press {channel}");
    }

    fn release(&mut self, channel: Channel) {
        self.releases += 1;
        info!("KEYS | release {channel}");
    }
}
