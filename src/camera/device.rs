//! # Camera Device Handle
//!
//! Owns the camera UART and the negotiated [`DeviceInfo`]. All exchanges
//! are synchronous: a request blocks the caller until a valid reply
//! arrives or the retry policy is exhausted.

use tracing::{debug, info, warn};

use super::clock::Clock;
use crate::error::{RcDeviceError, Result};
use crate::rcdevice::decoder::{
    decode_chunk, decode_connection_ack, decode_device_info, response_completion,
    verify_rcsplit_response, verify_response, Completion,
};
use crate::rcdevice::encoder::{encode_rcsplit_frame, encode_request, rcsplit_argument};
use crate::rcdevice::protocol::*;
use crate::rcdevice::settings::{
    decode_setting_detail, decode_settings_list, decode_write_ack, encode_write_payload,
    AssembledBuffer, ChunkAssembler, SettingDetail, SettingEntry, WriteSettingResponse,
};
use crate::serial::port_trait::SerialPortIO;

/// One validated response frame, header and crc included
pub type Response = heapless::Vec<u8, RCDEVICE_MAX_PACKET_SIZE>;

/// Per-attempt timeout and attempt count of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout_ms: u64,
    pub attempts: u32,
}

impl RetryPolicy {
    /// Device-info and handshake probes; tolerates a slow-booting camera
    pub const PROBE: RetryPolicy = RetryPolicy {
        timeout_ms: 300,
        attempts: 3,
    };

    /// Everything else; a 5-key press ack alone can take hundreds of ms
    pub const COMMAND: RetryPolicy = RetryPolicy {
        timeout_ms: 1000,
        attempts: 1,
    };
}

/// Handle to the camera peripheral
pub struct CameraDevice<P: SerialPortIO, C: Clock> {
    port: P,
    clock: C,
    info: Option<DeviceInfo>,
    probe_policy: RetryPolicy,
    command_policy: RetryPolicy,
}

impl<P: SerialPortIO, C: Clock> CameraDevice<P, C> {
    /// Wrap an open port; no bytes are exchanged until [`negotiate`](Self::negotiate)
    pub fn new(port: P, clock: C) -> Self {
        Self::with_policies(port, clock, RetryPolicy::PROBE, RetryPolicy::COMMAND)
    }

    pub fn with_policies(port: P, clock: C, probe_policy: RetryPolicy, command_policy: RetryPolicy) -> Self {
        Self {
            port,
            clock,
            info: None,
            probe_policy,
            command_policy,
        }
    }

    /// Negotiated peripheral description, `None` until negotiation succeeds
    pub fn info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.info.is_some()
    }

    /// Whether the negotiated peripheral advertises 5-key emulation
    pub fn supports_5key(&self) -> bool {
        self.info
            .map(|info| info.features.supports(Features::SIMULATE_5_KEY_OSD_CABLE))
            .unwrap_or(false)
    }

    fn ready_info(&self) -> Result<DeviceInfo> {
        self.info.ok_or(RcDeviceError::NotReady)
    }

    fn policy_for(&self, command: u8) -> RetryPolicy {
        match command {
            CMD_GET_DEVICE_INFO | CMD_CADDX_HANDSHAKE => self.probe_policy,
            _ => self.command_policy,
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Discard whatever is sitting in the receive buffer
    fn drain_input(&mut self) -> Result<()> {
        let mut discarded = 0usize;
        while self.port.bytes_available()? > 0 {
            self.port.read_byte()?;
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Discarded {} stale bytes", discarded);
        }
        Ok(())
    }

    /// Send one RCDEVICE frame without waiting for a reply
    fn send_frame(&mut self, command: u8, payload: &[u8]) -> Result<()> {
        let frame = encode_request(command, payload)?;
        debug!("TX cmd=0x{:02X} {:02X?}", command, frame.as_ref());
        self.port.write_all(&frame)?;
        self.port.flush()?;
        Ok(())
    }

    /// Read one response to `command` before `timeout_ms` elapses
    ///
    /// Bytes ahead of the header are skipped. A complete frame must pass
    /// [`verify_response`].
    fn receive(&mut self, command: u8, timeout_ms: u64) -> Result<Response> {
        let deadline = self.clock.now_ms() + timeout_ms;
        let mut response = Response::new();

        loop {
            if self.clock.now_ms() >= deadline {
                return Err(RcDeviceError::Timeout { command });
            }

            if self.port.bytes_available()? == 0 {
                std::hint::spin_loop();
                continue;
            }

            let byte = self.port.read_byte()?;
            if response.is_empty() && byte != RCDEVICE_HEADER {
                continue;
            }

            response.push(byte).map_err(|_| RcDeviceError::InvalidResponse {
                command,
                reason: "response exceeds packet size".to_string(),
            })?;

            match response_completion(command, &response) {
                Completion::NeedMore => {}
                Completion::Complete => {
                    verify_response(command, &response)?;
                    debug!("RX cmd=0x{:02X} {:02X?}", command, response.as_slice());
                    return Ok(response);
                }
                Completion::Malformed => {
                    return Err(RcDeviceError::InvalidResponse {
                        command,
                        reason: format!("malformed response {:02X?}", response.as_slice()),
                    });
                }
            }
        }
    }

    /// Send a request and wait for its validated response
    ///
    /// Every attempt drains stale input, resends the frame and waits the
    /// policy timeout. The policy is the probe policy for device-info and
    /// handshake requests and the command policy otherwise.
    ///
    /// # Errors
    ///
    /// The error of the last attempt: `Timeout` or `InvalidResponse`, or
    /// an I/O error which aborts immediately.
    pub fn send_and_wait(&mut self, command: u8, payload: &[u8]) -> Result<Response> {
        let policy = self.policy_for(command);
        let mut last_error = RcDeviceError::Timeout { command };

        for attempt in 1..=policy.attempts {
            self.drain_input()?;
            self.send_frame(command, payload)?;

            match self.receive(command, policy.timeout_ms) {
                Ok(response) => return Ok(response),
                Err(e @ (RcDeviceError::Timeout { .. } | RcDeviceError::InvalidResponse { .. })) => {
                    debug!(
                        "cmd=0x{:02X} attempt {}/{} failed: {}",
                        command, attempt, policy.attempts, e
                    );
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }

    /// Read one legacy 5-byte frame before `timeout_ms` elapses
    fn receive_rcsplit(&mut self, timeout_ms: u64) -> Result<[u8; RCSPLIT_PACKET_SIZE]> {
        let deadline = self.clock.now_ms() + timeout_ms;
        let mut frame = [0u8; RCSPLIT_PACKET_SIZE];
        let mut len = 0;

        while len < RCSPLIT_PACKET_SIZE {
            if self.clock.now_ms() >= deadline {
                return Err(RcDeviceError::Timeout {
                    command: RCSPLIT_COMMAND_CTRL,
                });
            }

            if self.port.bytes_available()? == 0 {
                std::hint::spin_loop();
                continue;
            }

            let byte = self.port.read_byte()?;
            if len == 0 && byte != RCSPLIT_HEADER {
                continue;
            }
            frame[len] = byte;
            len += 1;
        }

        Ok(frame)
    }

    /// Send the legacy who-are-you probe and check the echo
    fn probe_rcsplit(&mut self) -> Result<bool> {
        let frame = encode_rcsplit_frame(RCSPLIT_ARG_WHO_ARE_YOU);

        for attempt in 1..=self.probe_policy.attempts {
            self.drain_input()?;
            self.port.write_all(&frame)?;
            self.port.flush()?;

            match self.receive_rcsplit(self.probe_policy.timeout_ms) {
                Ok(echo) => match verify_rcsplit_response(&echo, RCSPLIT_ARG_WHO_ARE_YOU) {
                    Ok(()) => return Ok(true),
                    Err(e) => debug!("RCSplit probe attempt {}: {}", attempt, e),
                },
                Err(RcDeviceError::Timeout { .. }) => {
                    debug!("RCSplit probe attempt {} timed out", attempt)
                }
                Err(e) => return Err(e),
            }
        }

        Ok(false)
    }

    // ========================================================================
    // Negotiation
    // ========================================================================

    /// Determine which protocol family the peripheral speaks
    ///
    /// Tries the legacy probe, then RCDEVICE device info, then (when
    /// `caddx_probe` is set) the CADDX handshake. The first that answers
    /// fixes the family for the lifetime of the handle.
    ///
    /// # Errors
    ///
    /// Returns `NotReady` if no family answered; the handle then stays
    /// disabled and every operation fails with `NotReady`.
    pub fn negotiate(&mut self, caddx_probe: bool) -> Result<DeviceInfo> {
        if let Some(info) = self.info {
            return Ok(info);
        }

        let info = if self.probe_rcsplit()? {
            DeviceInfo {
                family: ProtocolFamily::RcSplit,
                protocol_version: PROTOCOL_VERSION_RCSPLIT,
                features: Features::RCSPLIT,
            }
        } else if let Some(info) = self.probe_rcdevice()? {
            info
        } else if caddx_probe && self.probe_caddx()? {
            DeviceInfo {
                family: ProtocolFamily::Caddx,
                protocol_version: PROTOCOL_VERSION_CADDX,
                features: Features::CADDX,
            }
        } else {
            warn!("Camera did not answer any protocol probe");
            return Err(RcDeviceError::NotReady);
        };

        info!(
            "Camera negotiated: {:?} v{} features=0x{:04X}",
            info.family, info.protocol_version, info.features.0
        );
        self.info = Some(info);
        Ok(info)
    }

    fn probe_rcdevice(&mut self) -> Result<Option<DeviceInfo>> {
        match self.send_and_wait(CMD_GET_DEVICE_INFO, &[]) {
            Ok(response) => decode_device_info(&response).map(Some),
            Err(RcDeviceError::Timeout { .. } | RcDeviceError::InvalidResponse { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn probe_caddx(&mut self) -> Result<bool> {
        match self.send_and_wait(CMD_CADDX_HANDSHAKE, &[]) {
            Ok(_) => Ok(true),
            Err(RcDeviceError::Timeout { .. } | RcDeviceError::InvalidResponse { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Camera control
    // ========================================================================

    /// Trigger a camera action
    ///
    /// Button simulations are fire-and-forget on RCSplit and RCDEVICE;
    /// CADDX camera actions wait for their ack.
    ///
    /// # Errors
    ///
    /// - `NotReady` before successful negotiation
    /// - `Unsupported` if the family or feature bitmask lacks the action
    pub fn simulate_button(&mut self, operation: CameraOperation) -> Result<()> {
        let info = self.ready_info()?;

        if let Some(feature) = operation.required_feature() {
            if !info.features.supports(feature) {
                return Err(RcDeviceError::Unsupported);
            }
        }

        match info.family {
            ProtocolFamily::RcSplit => {
                let argument = rcsplit_argument(operation).ok_or(RcDeviceError::Unsupported)?;
                self.port.write_all(&encode_rcsplit_frame(argument))?;
                self.port.flush()?;
            }
            ProtocolFamily::RcDevice => {
                let code = operation.rcdevice_code().ok_or(RcDeviceError::Unsupported)?;
                self.send_frame(CMD_CAMERA_CONTROL, &[code])?;
            }
            ProtocolFamily::Caddx => {
                let code = operation.caddx_code().ok_or(RcDeviceError::Unsupported)?;
                self.send_and_wait(CMD_CADDX_CAMERA_ACTION, &[code])?;
            }
        }

        debug!("Camera action {:?} sent", operation);
        Ok(())
    }

    // ========================================================================
    // 5-key OSD cable emulation
    // ========================================================================

    /// Send one 5-key remote event and wait for the peripheral to accept it
    ///
    /// Connection requests succeed only on an ack echoing the requested
    /// action with a success result. CADDX has no release command, so a
    /// CADDX release succeeds without wire traffic.
    ///
    /// # Errors
    ///
    /// - `NotReady` / `Unsupported` if 5-key emulation is unavailable
    /// - `DeviceError` if the connection ack reports failure
    /// - transport errors from [`send_and_wait`](Self::send_and_wait)
    pub fn send_key_event(&mut self, event: KeyEvent) -> Result<()> {
        let info = self.ready_info()?;
        if !info.features.supports(Features::SIMULATE_5_KEY_OSD_CABLE) {
            return Err(RcDeviceError::Unsupported);
        }

        match info.family {
            ProtocolFamily::RcSplit => Err(RcDeviceError::Unsupported),
            ProtocolFamily::RcDevice => self.send_rcdevice_key(event),
            ProtocolFamily::Caddx => match event.caddx_code() {
                Some(code) => self.send_and_wait(CMD_CADDX_KEY_INSTRUCTION, &[code]).map(|_| ()),
                None => Ok(()),
            },
        }
    }

    fn send_rcdevice_key(&mut self, event: KeyEvent) -> Result<()> {
        let action = match event {
            KeyEvent::ConnectionOpen => CONNECTION_OPEN,
            KeyEvent::ConnectionClose => CONNECTION_CLOSE,
            KeyEvent::Release => {
                self.send_and_wait(CMD_5KEY_SIMULATION_RELEASE, &[])?;
                return Ok(());
            }
            key => {
                let code = key.press_code().ok_or(RcDeviceError::Unsupported)?;
                self.send_and_wait(CMD_5KEY_SIMULATION_PRESS, &[code])?;
                return Ok(());
            }
        };

        let response = self.send_and_wait(CMD_5KEY_CONNECTION, &[action])?;
        match decode_connection_ack(&response) {
            Some((acked, CONNECTION_RESULT_SUCCESS)) if acked == action => Ok(()),
            Some((_, code)) => Err(RcDeviceError::DeviceError { code }),
            None => Err(RcDeviceError::InvalidResponse {
                command: CMD_5KEY_CONNECTION,
                reason: "connection ack too short".to_string(),
            }),
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    fn ensure_settings_access(&self) -> Result<()> {
        match self.ready_info()?.family {
            ProtocolFamily::RcDevice => Ok(()),
            _ => Err(RcDeviceError::Unsupported),
        }
    }

    /// Request chunk 0 and then every remaining chunk, in order
    fn fetch_chunked(&mut self, command: u8, id: u8) -> Result<AssembledBuffer> {
        let mut assembler = ChunkAssembler::new();

        while let Some(index) = assembler.next_index() {
            let response = self.send_and_wait(command, &[id, index])?;
            assembler.push(decode_chunk(command, &response)?)?;
        }

        Ok(assembler.finish())
    }

    /// Read the full typed detail of one setting
    ///
    /// # Errors
    ///
    /// Fails as a whole if any chunk request fails, if chunk 0 declares too
    /// many chunks (`ChunkOverflow`), or if the assembled bytes are short.
    pub fn read_setting_detail(&mut self, setting_id: u8) -> Result<SettingDetail> {
        self.ensure_settings_access()?;
        let data = self.fetch_chunked(CMD_READ_SETTING_DETAIL, setting_id)?;
        decode_setting_detail(&data)
    }

    /// List the settings below `parent_id`
    pub fn get_settings(
        &mut self,
        parent_id: u8,
    ) -> Result<heapless::Vec<SettingEntry, RCDEVICE_MAX_SETTINGS_PER_PAGE>> {
        self.ensure_settings_access()?;
        let data = self.fetch_chunked(CMD_GET_SETTINGS, parent_id)?;
        Ok(decode_settings_list(&data))
    }

    /// Write a raw setting value
    ///
    /// Never fails outright: a transport failure yields the default
    /// response, whose result code is a failure.
    pub fn write_setting(&mut self, setting_id: u8, value: &[u8]) -> WriteSettingResponse {
        if let Err(e) = self.ensure_settings_access() {
            debug!("write_setting({}) skipped: {}", setting_id, e);
            return WriteSettingResponse::default();
        }

        let payload = encode_write_payload(setting_id, value);
        match self.send_and_wait(CMD_WRITE_SETTING, &payload) {
            Ok(response) => decode_write_ack(&response),
            Err(e) => {
                warn!("write_setting({}) failed: {}", setting_id, e);
                WriteSettingResponse::default()
            }
        }
    }
}
