//! # RCDevice Bridge Library
//!
//! Host-side client for the RunCam/Caddx camera control protocol.
//!
//! This library provides the wire formats of the RCSplit, RCDEVICE and
//! CADDX protocol families, a synchronous request/retry engine over a
//! serial port, protocol negotiation, camera button simulation, 5-key OSD
//! remote emulation, settings access, and the stick-gesture state machine
//! that drives the camera menu from a gamepad.

pub mod camera;
pub mod config;
pub mod controller;
pub mod error;
pub mod rcdevice;
pub mod serial;
pub mod telemetry;
