//! Edge-triggered actuator state.
//!
//! One two-state machine per steering channel:
//!
//! ```text
//!            bit = 1 / Press
//!  Released ─────────────────▶ Pressed
//!      ▲                          │
//!      └──────────────────────────┘
//!            bit = 0 / Release
//! ```
//!
//! A bit equal to the current state emits nothing, so re-applying the same
//! decision every frame never produces duplicate key commands.

use core::fmt;

use crate::threshold::BinaryVector;

/// Number of actuator channels (and classifier outputs).
pub const CHANNEL_COUNT: usize = 4;

/// Steering channels, in classifier output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    Up = 0,
    Left = 1,
    Right = 2,
    Down = 3,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] =
        [Channel::Up, Channel::Left, Channel::Right, Channel::Down];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Left => "left",
            Self::Right => "right",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Released,
    Pressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Press,
    Release,
}

/// One edge on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub channel: Channel,
    pub kind: TransitionKind,
}

impl Transition {
    pub const fn press(channel: Channel) -> Self {
        Self {
            channel,
            kind: TransitionKind::Press,
        }
    }

    pub const fn release(channel: Channel) -> Self {
        Self {
            channel,
            kind: TransitionKind::Release,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TransitionKind::Press => write!(f, "Press({})", self.channel),
            TransitionKind::Release => write!(f, "Release({})", self.channel),
        }
    }
}

/// Transitions produced by one `apply`; at most one per channel.
pub type Transitions = heapless::Vec<Transition, CHANNEL_COUNT>;

/// Per-channel key state, all released at construction.
#[derive(Debug, Clone, Default)]
pub struct ActuatorStateController {
    state: [KeyState; CHANNEL_COUNT],
}

impl ActuatorStateController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, channel: Channel) -> KeyState {
        self.state[channel.index()]
    }

    pub fn is_pressed(&self, channel: Channel) -> bool {
        self.state(channel) == KeyState::Pressed
    }

    /// Bring every channel to the state in `bits`, returning one transition
    /// per channel that changed, in channel order.
    pub fn apply(&mut self, bits: &BinaryVector) -> Transitions {
        let mut out = Transitions::new();
        for channel in Channel::ALL {
            let want = if bits.get(channel) {
                KeyState::Pressed
            } else {
                KeyState::Released
            };
            let slot = &mut self.state[channel.index()];
            if *slot == want {
                continue;
            }
            *slot = want;
            let transition = match want {
                KeyState::Pressed => Transition::press(channel),
                KeyState::Released => Transition::release(channel),
            };
            // Capacity equals the channel count.
            let _ = out.push(transition);
        }
        out
    }

    /// Release every pressed channel.
    pub fn release_all(&mut self) -> Transitions {
        self.apply(&BinaryVector::default())
    }
}
