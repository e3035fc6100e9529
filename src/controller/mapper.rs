//! # Controller Input Mapper Module
//!
//! Folds raw evdev events from the DualSense into a [`ControllerState`] and
//! converts that state into the transmitter view the camera tick consumes.
//!
//! ## Stick Layout (Mode 2)
//!
//! | Axis | evdev Code | RC channel |
//! |------|------------|------------|
//! | Left Stick X | ABS_X | Yaw |
//! | Left Stick Y | ABS_Y | Throttle (up = high) |
//! | Right Stick X | ABS_Z | Roll |
//! | Right Stick Y | ABS_RZ | Pitch (up = high) |
//!
//! ## Buttons
//!
//! | Button | evdev Code | Function |
//! |--------|------------|----------|
//! | L1 | BTN_TL | Armed while held |
//! | Cross (×) | BTN_SOUTH | Camera switch 1 |
//! | Circle (○) | BTN_EAST | Camera switch 2 |
//! | Square (□) | BTN_WEST | Camera switch 3 |
//! | Options | BTN_START | Toggle local menu |
//!
//! ## Usage
//!
//! ```no_run
//! use rcdevice_bridge::controller::mapper::EventMapper;
//! use rcdevice_bridge::controller::ps5::DualSenseController;
//!
//! let mut controller = DualSenseController::open()?;
//! let mut mapper = EventMapper::new();
//!
//! loop {
//!     for event in controller.fetch_events()? {
//!         mapper.process_event(&event);
//!     }
//!     let rc = mapper.rc_snapshot();
//!     println!("yaw: {}", rc.yaw);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use evdev::{AbsoluteAxisType, InputEvent, Key};

use crate::camera::control::RcSnapshot;

/// Raw axis value range from DualSense controller.
pub const AXIS_MIN: i32 = 0;
/// Raw axis value range from DualSense controller.
pub const AXIS_MAX: i32 = 255;
/// Raw axis center value.
pub const AXIS_CENTER: i32 = 128;

/// RC channel range in microseconds
pub const RC_MIN_US: u16 = 1000;
pub const RC_MAX_US: u16 = 2000;

/// Scale a raw 0..=255 axis value into 1000..=2000 µs
///
/// # Examples
///
/// ```
/// use rcdevice_bridge::controller::mapper::axis_to_us;
///
/// assert_eq!(axis_to_us(0, false), 1000);
/// assert_eq!(axis_to_us(255, false), 2000);
/// assert_eq!(axis_to_us(0, true), 2000);
/// ```
#[must_use]
pub fn axis_to_us(raw: i32, inverted: bool) -> u16 {
    let clamped = raw.clamp(AXIS_MIN, AXIS_MAX);
    let value = if inverted { AXIS_MAX - clamped } else { clamped };
    let span = i32::from(RC_MAX_US - RC_MIN_US);
    (i32::from(RC_MIN_US) + value * span / AXIS_MAX) as u16
}

/// Controller inputs the bridge uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    /// Left stick X axis (Yaw). 0 = full left, 255 = full right.
    pub left_stick_x: i32,
    /// Left stick Y axis (Throttle). 0 = full up, 255 = full down.
    pub left_stick_y: i32,
    /// Right stick X axis (Roll). 0 = full left, 255 = full right.
    pub right_stick_x: i32,
    /// Right stick Y axis (Pitch). 0 = full up, 255 = full down.
    pub right_stick_y: i32,

    pub btn_cross: bool,
    pub btn_circle: bool,
    pub btn_square: bool,
    /// L1 (arm switch)
    pub btn_l1: bool,
    pub btn_options: bool,

    /// Local menu toggled by Options
    pub local_menu_open: bool,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            left_stick_x: AXIS_CENTER,
            left_stick_y: AXIS_CENTER,
            right_stick_x: AXIS_CENTER,
            right_stick_y: AXIS_CENTER,
            btn_cross: false,
            btn_circle: false,
            btn_square: false,
            btn_l1: false,
            btn_options: false,
            local_menu_open: false,
        }
    }
}

impl ControllerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transmitter view of this state
    #[must_use]
    pub fn to_rc_snapshot(&self) -> RcSnapshot {
        RcSnapshot {
            roll: axis_to_us(self.right_stick_x, false),
            pitch: axis_to_us(self.right_stick_y, true),
            yaw: axis_to_us(self.left_stick_x, false),
            throttle: axis_to_us(self.left_stick_y, true),
            armed: self.btn_l1,
            camera_switches: [self.btn_cross, self.btn_circle, self.btn_square],
            local_menu_open: self.local_menu_open,
        }
    }
}

/// Parses raw evdev events and maintains controller state.
///
/// Not thread-safe; use from a single task.
#[derive(Debug, Default)]
pub struct EventMapper {
    state: ControllerState,
}

impl EventMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    #[must_use]
    pub fn rc_snapshot(&self) -> RcSnapshot {
        self.state.to_rc_snapshot()
    }

    /// Processes a single evdev input event and updates internal state.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            evdev::InputEventKind::AbsAxis(axis) => self.process_axis_event(axis, event.value()),
            evdev::InputEventKind::Key(key) => self.process_key_event(key, event.value() != 0),
            _ => {}
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        match axis {
            AbsoluteAxisType::ABS_X => self.state.left_stick_x = value,
            AbsoluteAxisType::ABS_Y => self.state.left_stick_y = value,
            // DualSense reports the right stick on Z/RZ
            AbsoluteAxisType::ABS_Z => self.state.right_stick_x = value,
            AbsoluteAxisType::ABS_RZ => self.state.right_stick_y = value,
            _ => {}
        }
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        match key {
            Key::BTN_SOUTH => self.state.btn_cross = pressed,
            Key::BTN_EAST => self.state.btn_circle = pressed,
            Key::BTN_WEST => self.state.btn_square = pressed,
            Key::BTN_TL => self.state.btn_l1 = pressed,
            Key::BTN_START => {
                if pressed && !self.state.btn_options {
                    self.state.local_menu_open = !self.state.local_menu_open;
                }
                self.state.btn_options = pressed;
            }
            _ => {}
        }
    }

    /// Back to centered sticks and released buttons, e.g. after a reconnect
    pub fn reset(&mut self) {
        self.state = ControllerState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::EventType;

    fn make_axis_event(axis: AbsoluteAxisType, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE, axis.0, value)
    }

    fn make_key_event(key: Key, pressed: bool) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), if pressed { 1 } else { 0 })
    }

    #[test]
    fn test_axis_scaling() {
        assert_eq!(axis_to_us(AXIS_MIN, false), 1000);
        assert_eq!(axis_to_us(AXIS_MAX, false), 2000);
        assert_eq!(axis_to_us(AXIS_CENTER, false), 1501);
        assert_eq!(axis_to_us(AXIS_CENTER, true), 1498);
        assert_eq!(axis_to_us(-20, false), 1000);
        assert_eq!(axis_to_us(400, false), 2000);
    }

    #[test]
    fn test_default_snapshot_is_centered() {
        let rc = ControllerState::default().to_rc_snapshot();
        for value in [rc.roll, rc.pitch, rc.yaw, rc.throttle] {
            assert!((1250..=1750).contains(&value));
        }
        assert!(!rc.armed);
        assert_eq!(rc.camera_switches, [false; 3]);
        assert!(!rc.local_menu_open);
    }

    #[test]
    fn test_stick_events_map_to_channels() {
        let mut mapper = EventMapper::new();
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, AXIS_MAX));
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_Y, AXIS_MIN));
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_Z, AXIS_MIN));
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_RZ, AXIS_MAX));

        let rc = mapper.rc_snapshot();
        assert_eq!(rc.yaw, 2000);
        assert_eq!(rc.throttle, 2000);
        assert_eq!(rc.roll, 1000);
        assert_eq!(rc.pitch, 1000);
    }

    #[test]
    fn test_buttons_map_to_switches_and_arm() {
        let mut mapper = EventMapper::new();
        mapper.process_event(&make_key_event(Key::BTN_SOUTH, true));
        mapper.process_event(&make_key_event(Key::BTN_WEST, true));
        mapper.process_event(&make_key_event(Key::BTN_TL, true));

        let rc = mapper.rc_snapshot();
        assert_eq!(rc.camera_switches, [true, false, true]);
        assert!(rc.armed);

        mapper.process_event(&make_key_event(Key::BTN_TL, false));
        assert!(!mapper.rc_snapshot().armed);
    }

    #[test]
    fn test_options_toggles_local_menu_on_press() {
        let mut mapper = EventMapper::new();

        mapper.process_event(&make_key_event(Key::BTN_START, true));
        assert!(mapper.state().local_menu_open);
        // Autorepeat while held must not toggle again
        mapper.process_event(&make_key_event(Key::BTN_START, true));
        assert!(mapper.state().local_menu_open);

        mapper.process_event(&make_key_event(Key::BTN_START, false));
        mapper.process_event(&make_key_event(Key::BTN_START, true));
        assert!(!mapper.state().local_menu_open);
    }

    #[test]
    fn test_ignores_unmapped_events() {
        let mut mapper = EventMapper::new();
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_HAT0X, 1));
        mapper.process_event(&make_key_event(Key::BTN_MODE, true));
        assert_eq!(mapper.state(), &ControllerState::default());
    }

    #[test]
    fn test_reset() {
        let mut mapper = EventMapper::new();
        mapper.process_event(&make_key_event(Key::BTN_TL, true));
        mapper.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 10));
        mapper.reset();
        assert_eq!(mapper.state(), &ControllerState::default());
    }
}
