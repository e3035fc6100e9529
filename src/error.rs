//! # Error Types
//!
//! Custom error types for RCDevice Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for RCDevice Bridge
#[derive(Debug, Error)]
pub enum RcDeviceError {
    /// No response arrived before the deadline (after all retries)
    #[error("no response to command 0x{command:02X} before timeout")]
    Timeout { command: u8 },

    /// A response arrived but failed its checksum or framing check
    #[error("invalid response to command 0x{command:02X}: {reason}")]
    InvalidResponse { command: u8, reason: String },

    /// The peripheral reported failure in its result byte
    #[error("device reported error code {code}")]
    DeviceError { code: u8 },

    /// A settings read declared more remaining chunks than allowed
    #[error("declared {remaining} remaining chunks, at most {max} allowed")]
    ChunkOverflow { remaining: u8, max: u8 },

    /// Negotiation has not succeeded, the device is disabled
    #[error("camera device is not ready")]
    NotReady,

    /// The negotiated family or feature set does not offer this action
    #[error("operation not supported by the connected device")]
    Unsupported,

    /// Request payload does not fit in one frame
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial ports could be opened
    #[error("No camera serial port found (tried: {0})")]
    SerialPortNotFound(String),

    /// Controller errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No DualSense controller present
    #[error("No PS5 DualSense controller found")]
    ControllerNotFound,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Event log serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for RCDevice Bridge
pub type Result<T> = std::result::Result<T, RcDeviceError>;
