//! # Stick Gesture State Machine
//!
//! Turns transmitter stick deflections into events of the virtual 5-key
//! remote. A gesture yields one press, then nothing until the sticks are
//! centered again, when exactly one release follows.

use serde::{Deserialize, Serialize};

use crate::rcdevice::protocol::KeyEvent;

/// Tri-state classification of one stick channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickPosition {
    Low,
    Mid,
    High,
}

/// Channel values (µs) splitting low / mid / high
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickThresholds {
    /// Values strictly below are low
    pub low: u16,
    /// Values strictly above are high
    pub high: u16,
}

impl Default for StickThresholds {
    fn default() -> Self {
        Self {
            low: 1250,
            high: 1750,
        }
    }
}

/// Classify one channel value
///
/// # Examples
///
/// ```
/// use rcdevice_bridge::camera::gesture::{classify, StickPosition, StickThresholds};
///
/// let thresholds = StickThresholds::default();
/// assert_eq!(classify(1000, &thresholds), StickPosition::Low);
/// assert_eq!(classify(1500, &thresholds), StickPosition::Mid);
/// assert_eq!(classify(2000, &thresholds), StickPosition::High);
/// ```
pub fn classify(value: u16, thresholds: &StickThresholds) -> StickPosition {
    if value < thresholds.low {
        StickPosition::Low
    } else if value > thresholds.high {
        StickPosition::High
    } else {
        StickPosition::Mid
    }
}

/// Classified positions of the four primary sticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sticks {
    pub roll: StickPosition,
    pub pitch: StickPosition,
    pub yaw: StickPosition,
    pub throttle: StickPosition,
}

impl Sticks {
    pub fn classify(roll: u16, pitch: u16, yaw: u16, throttle: u16, thresholds: &StickThresholds) -> Self {
        Self {
            roll: classify(roll, thresholds),
            pitch: classify(pitch, thresholds),
            yaw: classify(yaw, thresholds),
            throttle: classify(throttle, thresholds),
        }
    }

    /// Roll, pitch and yaw centered; throttle is free
    pub fn centered(&self) -> bool {
        self.roll == StickPosition::Mid && self.pitch == StickPosition::Mid && self.yaw == StickPosition::Mid
    }

    fn throttle_roll_pitch_mid(&self) -> bool {
        self.throttle == StickPosition::Mid && self.roll == StickPosition::Mid && self.pitch == StickPosition::Mid
    }
}

/// Menu session state of one protocol family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureState {
    in_menu: bool,
    needs_release: bool,
}

impl GestureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_menu(&self) -> bool {
        self.in_menu
    }

    pub fn needs_release(&self) -> bool {
        self.needs_release
    }

    /// The event the current stick positions ask for, if any
    ///
    /// While a release is pending nothing but the release is produced, and
    /// only once the sticks are centered. Menu keys are matched in the
    /// order left, up, right, down, enter.
    pub fn next_event(&self, sticks: &Sticks, armed: bool) -> Option<KeyEvent> {
        use StickPosition::{High, Low};

        if self.needs_release {
            return sticks.centered().then_some(KeyEvent::Release);
        }

        if sticks.throttle_roll_pitch_mid() && sticks.yaw == Low {
            return self.in_menu.then_some(KeyEvent::ConnectionClose);
        }

        if !self.in_menu {
            let open = sticks.throttle_roll_pitch_mid() && sticks.yaw == High && !armed;
            return open.then_some(KeyEvent::ConnectionOpen);
        }

        if sticks.roll == Low {
            Some(KeyEvent::Left)
        } else if sticks.pitch == High {
            Some(KeyEvent::Up)
        } else if sticks.roll == High {
            Some(KeyEvent::Right)
        } else if sticks.pitch == Low {
            Some(KeyEvent::Down)
        } else if sticks.throttle_roll_pitch_mid() && sticks.yaw == High {
            Some(KeyEvent::Enter)
        } else {
            None
        }
    }

    /// Record the outcome of an event previously returned by `next_event`
    ///
    /// A rejected release drops the session instead of retrying it.
    pub fn apply(&mut self, event: KeyEvent, accepted: bool) {
        match (event, accepted) {
            (KeyEvent::Release, true) => self.needs_release = false,
            (KeyEvent::Release, false) => {
                self.needs_release = false;
                self.in_menu = false;
            }
            (KeyEvent::ConnectionOpen, true) => {
                self.in_menu = true;
                self.needs_release = true;
            }
            (KeyEvent::ConnectionClose, true) => {
                self.in_menu = false;
                self.needs_release = true;
            }
            (_, true) => self.needs_release = true,
            (_, false) => {}
        }
    }
}
