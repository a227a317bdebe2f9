//! Score binarisation.

use core::fmt;

use crate::actuator::{CHANNEL_COUNT, Channel};
use crate::predictor::ScoreVector;

/// One on/off decision per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinaryVector([bool; CHANNEL_COUNT]);

impl BinaryVector {
    pub const fn new(bits: [bool; CHANNEL_COUNT]) -> Self {
        Self(bits)
    }

    /// Build from `0`/`1` values; anything non-zero counts as on.
    pub fn from_bits(bits: [u8; CHANNEL_COUNT]) -> Self {
        Self(bits.map(|b| b != 0))
    }

    pub fn get(&self, channel: Channel) -> bool {
        self.0[channel.index()]
    }

    pub fn bits(&self) -> [bool; CHANNEL_COUNT] {
        self.0
    }

    pub fn active(&self) -> impl Iterator<Item = Channel> + '_ {
        Channel::ALL.into_iter().filter(|&ch| self.get(ch))
    }
}

impl fmt::Display for BinaryVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0.map(u8::from);
        write!(f, "[{a}, {b}, {c}, {d}]")
    }
}

/// Per channel: on iff `score > threshold`.  Strict, so a score equal to the
/// threshold is off; NaN is always off.
pub fn binarize(scores: &ScoreVector, threshold: f32) -> BinaryVector {
    BinaryVector(scores.values().map(|s| s > threshold))
}
