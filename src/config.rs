//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::camera::device::RetryPolicy;
use crate::camera::gesture::StickThresholds;
use crate::error::{RcDeviceError, Result};
use crate::serial::RCDEVICE_BAUD_RATE;

/// Baud rates the camera UART can be configured for
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub serial: SerialConfig,
    pub camera: CameraConfig,
    pub sticks: SticksConfig,
    pub controller: ControllerConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Camera UART configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Camera protocol timing and negotiation
#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_probe_attempts")]
    pub probe_attempts: u32,

    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    #[serde(default = "default_command_attempts")]
    pub command_attempts: u32,

    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    #[serde(default = "default_caddx_probe")]
    pub caddx_probe: bool,
}

/// Stick classification thresholds in µs
#[derive(Debug, Deserialize, Clone)]
pub struct SticksConfig {
    #[serde(default = "default_low_threshold")]
    pub low_threshold: u16,

    #[serde(default = "default_high_threshold")]
    pub high_threshold: u16,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Empty means autodetect
    #[serde(default)]
    pub device_path: String,
}

/// Event log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Diagnostic log output
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily-rolling log files; empty logs to stdout only
    #[serde(default)]
    pub file_dir: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { RCDEVICE_BAUD_RATE }

fn default_probe_timeout_ms() -> u64 { RetryPolicy::PROBE.timeout_ms }
fn default_probe_attempts() -> u32 { RetryPolicy::PROBE.attempts }
fn default_command_timeout_ms() -> u64 { RetryPolicy::COMMAND.timeout_ms }
fn default_command_attempts() -> u32 { RetryPolicy::COMMAND.attempts }
fn default_tick_rate_hz() -> u32 { 50 }
fn default_caddx_probe() -> bool { true }

fn default_low_threshold() -> u16 { 1250 }
fn default_high_threshold() -> u16 { 1750 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

fn invalid(message: impl std::fmt::Display) -> RcDeviceError {
    RcDeviceError::Config(toml::de::Error::custom(message))
}

impl CameraConfig {
    pub fn probe_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout_ms: self.probe_timeout_ms,
            attempts: self.probe_attempts,
        }
    }

    pub fn command_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout_ms: self.command_timeout_ms,
            attempts: self.command_attempts,
        }
    }
}

impl SticksConfig {
    pub fn thresholds(&self) -> StickThresholds {
        StickThresholds {
            low: self.low_threshold,
            high: self.high_threshold,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rcdevice_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `Config` if any value is out of its valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200",
            ));
        }

        for (name, value) in [
            ("probe_timeout_ms", self.camera.probe_timeout_ms),
            ("command_timeout_ms", self.camera.command_timeout_ms),
        ] {
            if value == 0 || value > 10000 {
                return Err(invalid(format!("{} must be between 1 and 10000", name)));
            }
        }

        for (name, value) in [
            ("probe_attempts", self.camera.probe_attempts),
            ("command_attempts", self.camera.command_attempts),
        ] {
            if value == 0 || value > 10 {
                return Err(invalid(format!("{} must be between 1 and 10", name)));
            }
        }

        if !(10..=200).contains(&self.camera.tick_rate_hz) {
            return Err(invalid("tick_rate_hz must be between 10 and 200"));
        }

        let sticks = &self.sticks;
        if sticks.low_threshold <= 1000
            || sticks.high_threshold >= 2000
            || sticks.low_threshold >= sticks.high_threshold
        {
            return Err(invalid(
                "stick thresholds must satisfy 1000 < low_threshold < high_threshold < 2000",
            ));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> Config {
        Config {
            serial: SerialConfig {
                port: default_serial_port(),
                baud_rate: default_baud_rate(),
            },
            camera: CameraConfig {
                probe_timeout_ms: default_probe_timeout_ms(),
                probe_attempts: default_probe_attempts(),
                command_timeout_ms: default_command_timeout_ms(),
                command_attempts: default_command_attempts(),
                tick_rate_hz: default_tick_rate_hz(),
                caddx_probe: default_caddx_probe(),
            },
            sticks: SticksConfig {
                low_threshold: default_low_threshold(),
                high_threshold: default_high_threshold(),
            },
            controller: ControllerConfig {
                device_path: String::new(),
            },
            telemetry: TelemetryConfig {
                enabled: default_telemetry_enabled(),
                log_dir: default_log_dir(),
                max_records_per_file: default_max_records_per_file(),
                max_files_to_keep: default_max_files_to_keep(),
            },
            logging: LoggingConfig::default(),
        }
    }

    fn load_str(toml_content: &str) -> Result<Config> {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        Config::load(temp_file.path())
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_defaults_match_protocol_policies() {
        let config = create_valid_config();
        assert_eq!(config.camera.probe_policy(), RetryPolicy::PROBE);
        assert_eq!(config.camera.command_policy(), RetryPolicy::COMMAND);
        assert_eq!(config.sticks.thresholds(), StickThresholds::default());
        assert_eq!(config.serial.baud_rate, RCDEVICE_BAUD_RATE);
        assert!(SUPPORTED_BAUD_RATES.contains(&RCDEVICE_BAUD_RATE));
    }

    #[test]
    fn test_load_config_from_file() {
        let config = load_str(
            r#"
[serial]
port = "/dev/ttyS1"

[camera]
command_timeout_ms = 1500

[sticks]

[controller]

[telemetry]
enabled = false
"#,
        )
        .unwrap();

        assert_eq!(config.serial.port, "/dev/ttyS1");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.camera.command_timeout_ms, 1500);
        assert_eq!(config.camera.probe_attempts, 3);
        assert!(config.camera.caddx_probe);
        assert!(!config.telemetry.enabled);
        assert!(config.logging.file_dir.is_empty());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let result = load_str(
            r#"
[serial]
baud_rate = 420000

[camera]

[sticks]

[controller]

[telemetry]
"#,
        );
        assert!(matches!(result, Err(RcDeviceError::Config(_))));
    }

    #[test]
    fn test_shipped_default_config_is_valid() {
        let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml")).unwrap();
        assert_eq!(config.camera.tick_rate_hz, default_tick_rate_hz());
        assert_eq!(config.sticks.thresholds(), StickThresholds::default());
    }

    #[test]
    fn test_load_missing_section() {
        let result = load_str("[serial]\n");
        assert!(matches!(result, Err(RcDeviceError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/rcdevice-bridge.toml");
        assert!(matches!(result, Err(RcDeviceError::Io(_))));
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = create_valid_config();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_baud_rates() {
        let mut config = create_valid_config();
        for baud in SUPPORTED_BAUD_RATES {
            config.serial.baud_rate = baud;
            assert!(config.validate().is_ok());
        }
        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = create_valid_config();
        config.camera.probe_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.camera.command_timeout_ms = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_attempt_bounds() {
        let mut config = create_valid_config();
        config.camera.command_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.camera.probe_attempts = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_rate_bounds() {
        let mut config = create_valid_config();
        config.camera.tick_rate_hz = 9;
        assert!(config.validate().is_err());
        config.camera.tick_rate_hz = 10;
        assert!(config.validate().is_ok());
        config.camera.tick_rate_hz = 200;
        assert!(config.validate().is_ok());
        config.camera.tick_rate_hz = 201;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stick_threshold_ordering() {
        let mut config = create_valid_config();
        config.sticks.low_threshold = 1800;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.sticks.low_threshold = 1000;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.sticks.high_threshold = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = create_valid_config();
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());

        config.telemetry.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_telemetry_limits() {
        let mut config = create_valid_config();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());
    }
}
