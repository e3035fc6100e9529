//! # Control Tick
//!
//! Per-tick driver that turns an [`RcSnapshot`] into camera actions and
//! 5-key events for the negotiated device.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::device::CameraDevice;
use super::gesture::{GestureState, StickThresholds, Sticks};
use crate::error::RcDeviceError;
use crate::rcdevice::protocol::{CameraOperation, KeyEvent, ProtocolFamily};
use crate::serial::port_trait::SerialPortIO;

/// Number of RC switches mapped to camera actions
pub const CAMERA_SWITCH_COUNT: usize = 3;

/// Transmitter state sampled once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RcSnapshot {
    /// Stick channels in µs (1000..=2000)
    pub roll: u16,
    pub pitch: u16,
    pub yaw: u16,
    pub throttle: u16,
    pub armed: bool,
    /// Level of each camera switch
    pub camera_switches: [bool; CAMERA_SWITCH_COUNT],
    /// A local on-screen menu has the sticks; gestures are ignored
    pub local_menu_open: bool,
}

impl Default for RcSnapshot {
    fn default() -> Self {
        Self {
            roll: 1500,
            pitch: 1500,
            yaw: 1500,
            throttle: 1500,
            armed: false,
            camera_switches: [false; CAMERA_SWITCH_COUNT],
            local_menu_open: false,
        }
    }
}

/// Audible notifications raised by the control tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    ConnectionOpened,
    ConnectionClosed,
}

/// Receiver of audible cues (beeper, rumble, log)
#[cfg_attr(test, mockall::automock)]
pub trait CueSink {
    fn notify(&mut self, cue: Cue);
}

/// Something the tick attempted on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlEvent {
    CameraAction { operation: CameraOperation, accepted: bool },
    Key { event: KeyEvent, accepted: bool },
}

/// Upper bound of events per tick: every switch plus one key event
pub type TickEvents = heapless::Vec<ControlEvent, { CAMERA_SWITCH_COUNT + 1 }>;

/// Edge latch for one level-held camera switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchState {
    activated: bool,
}

impl SwitchState {
    /// Starts activated so a switch already on at boot does not fire
    pub fn new() -> Self {
        Self { activated: true }
    }

    /// Feed the switch level; true on the off-to-on edge only
    pub fn rising_edge(&mut self, level: bool) -> bool {
        let edge = level && !self.activated;
        self.activated = level;
        edge
    }
}

impl Default for SwitchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Control-loop state owned by the caller across ticks
#[derive(Debug, Clone)]
pub struct ControlState {
    switches: [SwitchState; CAMERA_SWITCH_COUNT],
    rcdevice_gesture: GestureState,
    caddx_gesture: GestureState,
    recording: bool,
    thresholds: StickThresholds,
}

impl ControlState {
    pub fn new(thresholds: StickThresholds) -> Self {
        Self {
            switches: [SwitchState::new(); CAMERA_SWITCH_COUNT],
            rcdevice_gesture: GestureState::new(),
            caddx_gesture: GestureState::new(),
            recording: false,
            thresholds,
        }
    }

    /// Whether a camera menu session is open on either family
    pub fn in_menu(&self) -> bool {
        self.rcdevice_gesture.in_menu() || self.caddx_gesture.in_menu()
    }

    pub fn recording(&self) -> bool {
        self.recording
    }

    /// Run one control tick
    ///
    /// Does nothing until the device is negotiated. Camera switches fire on
    /// their rising edge. The gesture machine runs unless the local menu is
    /// open, the vehicle is armed or the device lacks 5-key emulation.
    ///
    /// # Returns
    ///
    /// Everything that was attempted on the wire this tick
    pub fn update<P: SerialPortIO, C: Clock>(
        &mut self,
        device: &mut CameraDevice<P, C>,
        rc: &RcSnapshot,
        cues: &mut dyn CueSink,
    ) -> TickEvents {
        let mut events = TickEvents::new();
        let family = match device.info() {
            Some(info) => info.family,
            None => return events,
        };

        for index in 0..CAMERA_SWITCH_COUNT {
            if !self.switches[index].rising_edge(rc.camera_switches[index]) {
                continue;
            }
            if let Some(event) = self.trigger_switch(device, family, index) {
                let _ = events.push(event);
            }
        }

        if rc.local_menu_open || rc.armed || !device.supports_5key() {
            return events;
        }

        let sticks = Sticks::classify(rc.roll, rc.pitch, rc.yaw, rc.throttle, &self.thresholds);
        let gesture = match family {
            ProtocolFamily::Caddx => &mut self.caddx_gesture,
            _ => &mut self.rcdevice_gesture,
        };

        if let Some(event) = gesture.next_event(&sticks, rc.armed) {
            let accepted = match device.send_key_event(event) {
                Ok(()) => true,
                Err(e) => {
                    debug!("Key event {:?} not accepted: {}", event, e);
                    false
                }
            };
            gesture.apply(event, accepted);

            match (event, accepted) {
                (KeyEvent::ConnectionOpen, true) => {
                    info!("Camera menu opened");
                    cues.notify(Cue::ConnectionOpened);
                }
                (KeyEvent::ConnectionClose, true) => {
                    info!("Camera menu closed");
                    cues.notify(Cue::ConnectionClosed);
                }
                _ => {}
            }

            let _ = events.push(ControlEvent::Key { event, accepted });
        }

        events
    }

    fn switch_operation(&self, family: ProtocolFamily, index: usize) -> Option<CameraOperation> {
        match family {
            ProtocolFamily::RcSplit | ProtocolFamily::RcDevice => [
                CameraOperation::SimulateWifiButton,
                CameraOperation::SimulatePowerButton,
                CameraOperation::ChangeMode,
            ]
            .get(index)
            .copied(),
            ProtocolFamily::Caddx => match index {
                0 if self.recording => Some(CameraOperation::StopRecording),
                0 => Some(CameraOperation::StartRecording),
                1 => Some(CameraOperation::TakePhoto),
                _ => None,
            },
        }
    }

    fn trigger_switch<P: SerialPortIO, C: Clock>(
        &mut self,
        device: &mut CameraDevice<P, C>,
        family: ProtocolFamily,
        index: usize,
    ) -> Option<ControlEvent> {
        let operation = self.switch_operation(family, index)?;

        let accepted = match device.simulate_button(operation) {
            Ok(()) => true,
            Err(RcDeviceError::Unsupported) => {
                debug!("Camera switch {} ({:?}) not supported", index + 1, operation);
                return None;
            }
            Err(e) => {
                warn!("Camera switch {} ({:?}) failed: {}", index + 1, operation, e);
                false
            }
        };

        if accepted {
            match operation {
                CameraOperation::StartRecording => self.recording = true,
                CameraOperation::StopRecording => self.recording = false,
                _ => {}
            }
        }

        Some(ControlEvent::CameraAction { operation, accepted })
    }
}
