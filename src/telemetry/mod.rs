//! # Telemetry Module
//!
//! Handles event logging to JSONL files with rotation.
//!
//! This module handles:
//! - Recording negotiation results, camera actions, key events and cues
//! - Formatting as JSONL (JSON Lines) with UTC timestamps
//! - Rotating files every N records and retaining only the last M files

pub mod logger;

pub use logger::{EventLogger, LogEntry};
