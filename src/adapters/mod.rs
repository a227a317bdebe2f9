//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter           | Implements        | Connects to                  |
//! |-------------------|-------------------|------------------------------|
//! | `interval_source` | FrameSource       | any FrameGrabber, on a timer |
//! | `log_actuator`    | ActuatorPort      | log output (dry run)         |
//! | `log_sink`        | EventSink         | log output                   |
//! | `tract_engine`    | InferenceEngine   | ONNX model via tract         |

pub mod interval_source;
pub mod log_actuator;
pub mod log_sink;
#[cfg(feature = "onnx")]
pub mod tract_engine;
