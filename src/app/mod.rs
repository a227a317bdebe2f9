//! Application core — the frame-to-keys pipeline, zero I/O.
//!
//! The [`service::Player`] runs window → predictor → threshold → key state
//! for every frame.  All interaction with capture and key injection happens
//! through the **port traits** in [`ports`], keeping this layer testable
//! without a screen or a keyboard.

pub mod events;
pub mod ports;
pub mod service;
