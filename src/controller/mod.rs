//! # Controller Module
//!
//! PS5 DualSense controller standing in for the RC transmitter.
//!
//! This module handles:
//! - DualSense detection and connection via evdev
//! - Folding stick and button events into controller state
//! - Producing the per-tick [`RcSnapshot`](crate::camera::RcSnapshot)

pub mod mapper;
pub mod ps5;
