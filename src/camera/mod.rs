//! # Camera Module
//!
//! Host side of the RunCam/Caddx camera control link.
//!
//! This module handles:
//! - Request/response exchanges with bounded retries ([`device`])
//! - Protocol family negotiation (RCSplit, RCDEVICE, CADDX)
//! - Button simulation, 5-key OSD remote emulation and settings access
//! - Stick gestures and switch edges driving the above ([`gesture`], [`control`])

pub mod clock;
pub mod control;
pub mod device;
pub mod gesture;

pub use clock::{Clock, MonotonicClock};
pub use control::{ControlEvent, ControlState, Cue, CueSink, RcSnapshot};
pub use device::{CameraDevice, RetryPolicy};
