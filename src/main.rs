//! # RCDevice Bridge
//!
//! Drive a RunCam/Caddx camera's control UART from a PS5 DualSense
//! controller: camera buttons on the face buttons, the camera's on-screen
//! menu through stick gestures.

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::mpsc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use rcdevice_bridge::camera::{CameraDevice, ControlState, Cue, CueSink, MonotonicClock, RcSnapshot};
use rcdevice_bridge::config::{Config, LoggingConfig};
use rcdevice_bridge::controller::mapper::EventMapper;
use rcdevice_bridge::controller::ps5::DualSenseController;
use rcdevice_bridge::rcdevice::protocol::KeyEvent;
use rcdevice_bridge::serial::CameraSerial;
use rcdevice_bridge::telemetry::{EventLogger, LogEntry};

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Name of the daily-rolling diagnostic log file
const LOG_FILE_NAME: &str = "rcdevice-bridge.log";

/// Period of the control tick
fn tick_period(tick_rate_hz: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(tick_rate_hz.max(1)))
}

/// Install the tracing subscriber, adding a file layer when configured
///
/// The returned guard must stay alive for buffered file output to be flushed.
fn init_logging(config: &LoggingConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if config.file_dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.file_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
        .init();

    Some(guard)
}

/// Cue sink of the binary: log line, terminal bell and event log
struct Cues {
    logger: Option<EventLogger>,
}

impl CueSink for Cues {
    fn notify(&mut self, cue: Cue) {
        info!("Cue: {:?}", cue);
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();

        if let Some(logger) = self.logger.as_mut() {
            logger.notify(cue);
        }
    }
}

/// Read controller events on a dedicated thread, publishing a snapshot after each batch
///
/// `fetch_events` blocks, so this runs outside the async runtime. The thread
/// ends when the controller disconnects or the receiver is dropped.
fn spawn_controller_reader(
    mut controller: DualSenseController,
    snapshots: watch::Sender<RcSnapshot>,
    disconnected: mpsc::Sender<()>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("controller".to_string())
        .spawn(move || {
            let mut mapper = EventMapper::new();
            loop {
                match controller.fetch_events() {
                    Ok(events) => {
                        for event in events {
                            mapper.process_event(&event);
                        }
                    }
                    Err(e) => {
                        warn!("{}", e);
                        mapper.reset();
                        let _ = snapshots.send(mapper.rc_snapshot());
                        let _ = disconnected.send(());
                        return;
                    }
                }

                if snapshots.send(mapper.rc_snapshot()).is_err() {
                    return;
                }
            }
        })
}

/// Main entry point
///
/// # Control Flow
///
/// 1. Load configuration (first argument, default `config/default.toml`)
///    and install logging
/// 2. Open the camera UART and negotiate the protocol family
/// 3. Open the controller and read it on its own thread
/// 4. Run the control tick at `tick_rate_hz` until Ctrl+C or controller loss
/// 5. Close an open camera menu session on the way out
///
/// # Errors
///
/// Returns error if the configuration is invalid, the UART or controller
/// cannot be opened, or the camera does not answer negotiation.
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging);
    info!("RCDevice Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut logger = if config.telemetry.enabled {
        Some(
            EventLogger::new(
                &config.telemetry.log_dir,
                config.telemetry.max_records_per_file,
                config.telemetry.max_files_to_keep,
            )
            .context("Failed to create event log directory")?,
        )
    } else {
        None
    };

    let serial = CameraSerial::open_with_paths(&[config.serial.port.as_str()], config.serial.baud_rate)?;
    let mut device = CameraDevice::with_policies(
        serial,
        MonotonicClock::new(),
        config.camera.probe_policy(),
        config.camera.command_policy(),
    );

    let negotiated = tokio::task::block_in_place(|| device.negotiate(config.camera.caddx_probe));
    if let Some(logger) = logger.as_mut() {
        let entry = match &negotiated {
            Ok(info) => LogEntry::from(info),
            Err(_) => LogEntry::NegotiationFailed,
        };
        if let Err(e) = logger.log(&entry) {
            warn!("Failed to write event log: {}", e);
        }
    }
    let info = negotiated.context("Camera did not answer negotiation")?;
    info!(
        "Camera ready: {:?}, 5-key emulation {}",
        info.family,
        if device.supports_5key() { "available" } else { "unavailable" }
    );

    let controller = DualSenseController::open_configured(&config.controller.device_path)?;
    let (snapshot_tx, snapshot_rx) = watch::channel(RcSnapshot::default());
    let (disconnect_tx, disconnect_rx) = mpsc::channel();
    spawn_controller_reader(controller, snapshot_tx, disconnect_tx)
        .context("Failed to start controller thread")?;

    let mut state = ControlState::new(config.sticks.thresholds());
    let mut cues = Cues { logger };

    let mut ticker = interval(tick_period(config.camera.tick_rate_hz));
    // A 5-key exchange can hold a tick for up to a second
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Control tick running at {}Hz", config.camera.tick_rate_hz);
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if disconnect_rx.try_recv().is_ok() {
                    warn!("Controller disconnected, shutting down...");
                    break;
                }

                let rc = *snapshot_rx.borrow();
                let events = tokio::task::block_in_place(|| state.update(&mut device, &rc, &mut cues));
                for event in &events {
                    debug!("{:?}", event);
                }
                if let Some(logger) = cues.logger.as_mut() {
                    logger.log_events(&events);
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    if state.in_menu() {
        info!("Closing camera menu session");
        if let Err(e) = tokio::task::block_in_place(|| device.send_key_event(KeyEvent::ConnectionClose)) {
            warn!("Failed to close camera menu: {}", e);
        }
    }

    Ok(())
}
