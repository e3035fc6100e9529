//! # PS5 DualSense Controller Module
//!
//! Finds the DualSense gamepad that stands in for the transmitter and reads
//! its input events through the Linux evdev interface.
//!
//! ## Controller Detection
//!
//! The DualSense controller is identified by:
//! - Vendor ID: 0x054c (Sony)
//! - Product ID: 0x0ce6 (DualSense, both wired and Bluetooth)

use evdev::Device;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{RcDeviceError, Result};

/// PS5 DualSense vendor ID (Sony)
const DUALSENSE_VENDOR_ID: u16 = 0x054c;

/// PS5 DualSense product ID (wired and Bluetooth)
const DUALSENSE_PRODUCT_ID: u16 = 0x0ce6;

const INPUT_DIR: &str = "/dev/input";

/// Open evdev handle to a DualSense controller
pub struct DualSenseController {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for DualSenseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualSenseController")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

fn is_dualsense(device: &Device) -> bool {
    let id = device.input_id();
    id.vendor() == DUALSENSE_VENDOR_ID && id.product() == DUALSENSE_PRODUCT_ID
}

impl DualSenseController {
    /// Open the configured controller, or scan for one when `device_path` is empty
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound` if no DualSense is present
    /// - `Controller` if the configured device is not a DualSense or cannot be opened
    pub fn open_configured(device_path: &str) -> Result<Self> {
        if device_path.is_empty() {
            Self::open()
        } else {
            Self::open_path(device_path)
        }
    }

    /// Open a specific `/dev/input/eventX` node
    pub fn open_path(device_path: &str) -> Result<Self> {
        let device = Device::open(device_path)
            .map_err(|e| RcDeviceError::Controller(format!("Failed to open {}: {}", device_path, e)))?;

        if !is_dualsense(&device) {
            return Err(RcDeviceError::Controller(format!(
                "{} is not a DualSense controller",
                device_path
            )));
        }

        info!("Opened PS5 DualSense controller at: {}", device_path);
        Ok(Self {
            device,
            device_path: device_path.to_string(),
        })
    }

    /// Detect and open the first available DualSense controller
    ///
    /// Scans `/dev/input/event*` in sorted order so the choice is stable
    /// when several controllers are connected.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rcdevice_bridge::controller::ps5::DualSenseController;
    ///
    /// let controller = DualSenseController::open()?;
    /// println!("Connected to controller at: {}", controller.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open() -> Result<Self> {
        let input_dir = Path::new(INPUT_DIR);
        if !input_dir.exists() {
            return Err(RcDeviceError::Controller(format!("{} directory not found", INPUT_DIR)));
        }

        let mut paths: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| RcDeviceError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().starts_with("event"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        for path in paths {
            match Device::open(&path) {
                Ok(device) if is_dualsense(&device) => {
                    let device_path = path.to_string_lossy().to_string();
                    info!("Found PS5 DualSense controller at: {}", device_path);
                    return Ok(Self { device, device_path });
                }
                Ok(_) => debug!("Skipping input device {}", path.display()),
                Err(e) => debug!("Could not open {}: {}", path.display(), e),
            }
        }

        Err(RcDeviceError::ControllerNotFound)
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Human-readable device name reported by the kernel
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Fetch pending input events; blocks until at least one is available
    ///
    /// # Errors
    ///
    /// Returns `Controller` if reading fails (e.g., controller disconnected).
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = evdev::InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| RcDeviceError::Controller(format!("Failed to fetch events: {}", e)))
    }
}
