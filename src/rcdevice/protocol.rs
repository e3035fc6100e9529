//! # RCDevice Protocol Constants and Types
//!
//! Core protocol definitions for the RunCam device protocol family: the
//! modern RCDEVICE framing, the legacy RCSplit framing and the CADDX
//! command set that rides on the RCDEVICE envelope.

/// RCDEVICE frame header byte
pub const RCDEVICE_HEADER: u8 = 0xCC;

/// Maximum RCDEVICE frame size (header + command + payload + crc)
pub const RCDEVICE_MAX_PACKET_SIZE: usize = 64;

/// Maximum request payload size
/// Frame structure: header(1) + command(1) + payload(N) + crc(1)
pub const RCDEVICE_MAX_PAYLOAD_SIZE: usize = RCDEVICE_MAX_PACKET_SIZE - 3;

/// Largest payload a chunked settings response may declare
pub const RCDEVICE_MAX_CHUNK_DATA_SIZE: usize = 60;

/// Envelope around a chunk payload: header + remaining + length + crc
pub const RCDEVICE_CHUNK_ENVELOPE_SIZE: usize = 4;

/// Remaining-chunk counts must stay below this ceiling
pub const RCDEVICE_MAX_CHUNKS_PER_RESPONSE: u8 = 12;

/// Capacity of the reassembly buffer for chunked responses
pub const RCDEVICE_MAX_ASSEMBLED_SIZE: usize =
    RCDEVICE_MAX_CHUNKS_PER_RESPONSE as usize * RCDEVICE_MAX_CHUNK_DATA_SIZE;

/// Setting name/value label length
pub const RCDEVICE_MAX_SETTING_NAME_LENGTH: usize = 20;
pub const RCDEVICE_MAX_SETTING_VALUE_LENGTH: usize = 20;

/// Text selection labels kept per setting
pub const RCDEVICE_MAX_TEXT_SELECTIONS: usize = 30;

/// Inline string buffer for string/info settings
pub const RCDEVICE_MAX_STRING_LENGTH: usize = 58;

/// Settings listed per folder
pub const RCDEVICE_MAX_SETTINGS_PER_PAGE: usize = 16;

// Command IDs
pub const CMD_GET_DEVICE_INFO: u8 = 0x00;
pub const CMD_CAMERA_CONTROL: u8 = 0x01;
pub const CMD_5KEY_SIMULATION_PRESS: u8 = 0x02;
pub const CMD_5KEY_SIMULATION_RELEASE: u8 = 0x03;
pub const CMD_5KEY_CONNECTION: u8 = 0x04;
pub const CMD_GET_SETTINGS: u8 = 0x10;
pub const CMD_READ_SETTING_DETAIL: u8 = 0x11;
pub const CMD_WRITE_SETTING: u8 = 0x13;

// CADDX commands share the RCDEVICE envelope
pub const CMD_CADDX_HANDSHAKE: u8 = 0x30;
pub const CMD_CADDX_CAMERA_ACTION: u8 = 0x31;
pub const CMD_CADDX_KEY_INSTRUCTION: u8 = 0x32;

/// Protocol version byte reported by RCDEVICE 1.0 peripherals
pub const PROTOCOL_VERSION_RCSPLIT: u8 = 0x00;
pub const PROTOCOL_VERSION_1_0: u8 = 0x01;

/// Version sentinel recorded once a CADDX peripheral has been detected
pub const PROTOCOL_VERSION_CADDX: u8 = 0xCA;

// 5-key connection action IDs (high nibble of the ack)
pub const CONNECTION_OPEN: u8 = 0x01;
pub const CONNECTION_CLOSE: u8 = 0x02;

/// Result nibble the peripheral reports for an accepted connection change
pub const CONNECTION_RESULT_SUCCESS: u8 = 0x01;

/// Result byte of a successful write-setting ack
pub const WRITE_SETTING_SUCCESS: u8 = 0x00;

/// Legacy RCSplit framing: `[0x55][0x01][argument][crc][0xAA]`
pub const RCSPLIT_HEADER: u8 = 0x55;
pub const RCSPLIT_COMMAND_CTRL: u8 = 0x01;
pub const RCSPLIT_TAIL: u8 = 0xAA;
pub const RCSPLIT_PACKET_SIZE: usize = 5;

/// Legacy "who are you" probe argument
pub const RCSPLIT_ARG_WHO_ARE_YOU: u8 = 0xFF;

/// Feature bitmask advertised by the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features(pub u16);

impl Features {
    pub const SIMULATE_POWER_BUTTON: u16 = 1 << 0;
    pub const SIMULATE_WIFI_BUTTON: u16 = 1 << 1;
    pub const CHANGE_MODE: u16 = 1 << 2;
    pub const SIMULATE_5_KEY_OSD_CABLE: u16 = 1 << 3;
    pub const START_RECORDING: u16 = 1 << 6;
    pub const STOP_RECORDING: u16 = 1 << 7;
    pub const CMS_MENU: u16 = 1 << 8;

    /// Fixed feature set of a legacy RCSplit peripheral
    pub const RCSPLIT: Features =
        Features(Self::SIMULATE_POWER_BUTTON | Self::SIMULATE_WIFI_BUTTON | Self::CHANGE_MODE);

    /// Feature set synthesized for a CADDX peripheral
    pub const CADDX: Features =
        Features(Self::START_RECORDING | Self::STOP_RECORDING | Self::SIMULATE_5_KEY_OSD_CABLE);

    #[must_use]
    pub fn supports(self, feature: u16) -> bool {
        self.0 & feature == feature
    }
}

/// Protocol family chosen once at negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolFamily {
    /// Legacy RCSplit (header 0x55, tail 0xAA)
    RcSplit,
    /// RCDEVICE 1.0 (header 0xCC)
    RcDevice,
    /// CADDX/turtle v2
    Caddx,
}

/// Negotiated description of the connected peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub family: ProtocolFamily,
    pub protocol_version: u8,
    pub features: Features,
}

/// Camera actions that can be triggered from an RC switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraOperation {
    SimulateWifiButton,
    SimulatePowerButton,
    ChangeMode,
    StartRecording,
    StopRecording,
    TakePhoto,
}

impl CameraOperation {
    /// RCDEVICE camera-control operation code, where one exists
    #[must_use]
    pub fn rcdevice_code(self) -> Option<u8> {
        match self {
            CameraOperation::SimulateWifiButton => Some(0x00),
            CameraOperation::SimulatePowerButton => Some(0x01),
            CameraOperation::ChangeMode => Some(0x02),
            CameraOperation::StartRecording => Some(0x03),
            CameraOperation::StopRecording => Some(0x04),
            CameraOperation::TakePhoto => None,
        }
    }

    /// Feature bit that gates this operation on RCDEVICE/RCSplit peripherals
    #[must_use]
    pub fn required_feature(self) -> Option<u16> {
        match self {
            CameraOperation::SimulateWifiButton => Some(Features::SIMULATE_WIFI_BUTTON),
            CameraOperation::SimulatePowerButton => Some(Features::SIMULATE_POWER_BUTTON),
            CameraOperation::ChangeMode => Some(Features::CHANGE_MODE),
            CameraOperation::StartRecording => Some(Features::START_RECORDING),
            CameraOperation::StopRecording => Some(Features::STOP_RECORDING),
            CameraOperation::TakePhoto => None,
        }
    }

    /// CADDX camera-action code, where one exists
    #[must_use]
    pub fn caddx_code(self) -> Option<u8> {
        match self {
            CameraOperation::StartRecording => Some(0x01),
            CameraOperation::StopRecording => Some(0x02),
            CameraOperation::TakePhoto => Some(0x03),
            _ => None,
        }
    }
}

/// Events of the virtual 5-key remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEvent {
    Enter,
    Left,
    Up,
    Right,
    Down,
    ConnectionClose,
    ConnectionOpen,
    Release,
}

impl KeyEvent {
    /// RCDEVICE 5-key press operation code (directional keys and enter only)
    #[must_use]
    pub fn press_code(self) -> Option<u8> {
        match self {
            KeyEvent::Enter => Some(0x01),
            KeyEvent::Left => Some(0x02),
            KeyEvent::Right => Some(0x03),
            KeyEvent::Up => Some(0x04),
            KeyEvent::Down => Some(0x05),
            _ => None,
        }
    }

    /// CADDX key-instruction direction code (release has none)
    #[must_use]
    pub fn caddx_code(self) -> Option<u8> {
        match self {
            KeyEvent::Enter => Some(0x01),
            KeyEvent::Left => Some(0x02),
            KeyEvent::Up => Some(0x03),
            KeyEvent::Right => Some(0x04),
            KeyEvent::Down => Some(0x05),
            KeyEvent::ConnectionOpen => Some(0x06),
            KeyEvent::ConnectionClose => Some(0x07),
            KeyEvent::Release => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constants() {
        assert_eq!(RCDEVICE_HEADER, 0xCC);
        assert_eq!(RCDEVICE_MAX_PAYLOAD_SIZE, 61);
        assert_eq!(RCSPLIT_HEADER, 0x55);
        assert_eq!(RCSPLIT_TAIL, 0xAA);
        assert_eq!(RCDEVICE_MAX_ASSEMBLED_SIZE, 720);
    }

    #[test]
    fn test_feature_bits() {
        assert_eq!(Features::SIMULATE_POWER_BUTTON, 0x01);
        assert_eq!(Features::SIMULATE_WIFI_BUTTON, 0x02);
        assert_eq!(Features::CHANGE_MODE, 0x04);
        assert_eq!(Features::SIMULATE_5_KEY_OSD_CABLE, 0x08);
        assert_eq!(Features::START_RECORDING, 0x40);
        assert_eq!(Features::STOP_RECORDING, 0x80);
        assert_eq!(Features::CMS_MENU, 0x100);
    }

    #[test]
    fn test_high_feature_bit_survives() {
        let features = Features(Features::CMS_MENU | Features::SIMULATE_5_KEY_OSD_CABLE);
        assert!(features.supports(Features::CMS_MENU));
        assert!(!features.supports(Features::START_RECORDING));
    }

    #[test]
    fn test_rcsplit_features() {
        let features = Features::RCSPLIT;
        assert!(features.supports(Features::SIMULATE_POWER_BUTTON));
        assert!(features.supports(Features::SIMULATE_WIFI_BUTTON));
        assert!(features.supports(Features::CHANGE_MODE));
        assert!(!features.supports(Features::SIMULATE_5_KEY_OSD_CABLE));
        assert_eq!(features.0, 0x07);
    }

    #[test]
    fn test_camera_operation_codes() {
        assert_eq!(CameraOperation::SimulateWifiButton.rcdevice_code(), Some(0x00));
        assert_eq!(CameraOperation::SimulatePowerButton.rcdevice_code(), Some(0x01));
        assert_eq!(CameraOperation::ChangeMode.rcdevice_code(), Some(0x02));
        assert_eq!(CameraOperation::TakePhoto.rcdevice_code(), None);
        assert_eq!(CameraOperation::ChangeMode.caddx_code(), None);
        assert_eq!(CameraOperation::TakePhoto.caddx_code(), Some(0x03));
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(KeyEvent::Enter.press_code(), Some(0x01));
        assert_eq!(KeyEvent::Up.press_code(), Some(0x04));
        assert_eq!(KeyEvent::Release.press_code(), None);
        assert_eq!(KeyEvent::ConnectionOpen.press_code(), None);
        assert_eq!(KeyEvent::Release.caddx_code(), None);
    }
}
