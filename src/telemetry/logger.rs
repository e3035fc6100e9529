//! JSONL event logger with size-based rotation

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::camera::control::{ControlEvent, Cue, CueSink};
use crate::error::Result;
use crate::rcdevice::protocol::{DeviceInfo, ProtocolFamily};

const FILE_PREFIX: &str = "events_";
const FILE_EXTENSION: &str = "jsonl";

/// One logged occurrence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEntry {
    Negotiated {
        family: ProtocolFamily,
        protocol_version: u8,
        features: u16,
    },
    NegotiationFailed,
    Control {
        event: ControlEvent,
    },
    Cue {
        cue: Cue,
    },
}

impl From<&DeviceInfo> for LogEntry {
    fn from(info: &DeviceInfo) -> Self {
        LogEntry::Negotiated {
            family: info.family,
            protocol_version: info.protocol_version,
            features: info.features.0,
        }
    }
}

#[derive(Serialize)]
struct LogRecord<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    entry: &'a LogEntry,
}

/// Appends [`LogEntry`] records to `events_*.jsonl` files
///
/// A new file is started every `max_records_per_file` records and only the
/// newest `max_files_to_keep` files are kept.
pub struct EventLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    sequence: u32,
}

impl EventLogger {
    /// Create the log directory if needed; the first file is opened lazily
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created
    pub fn new<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            sequence: 0,
        })
    }

    /// Append one record and flush it
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Json` if the record cannot be written
    pub fn log(&mut self, entry: &LogEntry) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = LogRecord {
            timestamp: Utc::now(),
            entry,
        };

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, &record)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }

        Ok(())
    }

    /// Log every event of one control tick
    pub fn log_events<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a ControlEvent>,
    {
        for event in events {
            let entry = LogEntry::Control { event: *event };
            if let Err(e) = self.log(&entry) {
                warn!("Failed to write event log: {}", e);
            }
        }
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.sequence,
            FILE_EXTENSION
        );
        self.sequence = self.sequence.wrapping_add(1);

        let path = self.dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Event log file: {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;
        self.prune()?;
        Ok(())
    }

    /// Delete the oldest log files beyond the retention limit
    fn prune(&self) -> Result<()> {
        let mut files = self.log_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            debug!("Removing old event log {}", path.display());
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Event log files in the log directory
    pub fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_log = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with(FILE_PREFIX))
                .unwrap_or(false)
                && path.extension().map(|ext| ext == FILE_EXTENSION).unwrap_or(false);
            if is_log {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl CueSink for EventLogger {
    fn notify(&mut self, cue: Cue) {
        if let Err(e) = self.log(&LogEntry::Cue { cue }) {
            warn!("Failed to write event log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcdevice::protocol::{CameraOperation, Features, KeyEvent};
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_jsonl_records() {
        let dir = TempDir::new().unwrap();
        let mut logger = EventLogger::new(dir.path(), 100, 5).unwrap();

        let info = DeviceInfo {
            family: ProtocolFamily::RcDevice,
            protocol_version: 1,
            features: Features(0x0F),
        };
        logger.log(&LogEntry::from(&info)).unwrap();
        logger.log_events(&[ControlEvent::Key {
            event: KeyEvent::ConnectionOpen,
            accepted: true,
        }]);
        logger.notify(Cue::ConnectionOpened);

        let files = logger.log_files().unwrap();
        assert_eq!(files.len(), 1);

        let records = read_lines(&files[0]);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["type"], "negotiated");
        assert_eq!(records[0]["family"], "rc_device");
        assert_eq!(records[0]["features"], 15);
        assert!(records[0]["timestamp"].is_string());
        assert_eq!(records[1]["type"], "control");
        assert_eq!(records[1]["event"]["kind"], "key");
        assert_eq!(records[1]["event"]["event"], "connection_open");
        assert_eq!(records[2]["cue"], "connection_opened");
    }

    #[test]
    fn test_rotates_and_prunes() {
        let dir = TempDir::new().unwrap();
        let mut logger = EventLogger::new(dir.path(), 2, 2).unwrap();
        let entry = LogEntry::Control {
            event: ControlEvent::CameraAction {
                operation: CameraOperation::SimulatePowerButton,
                accepted: true,
            },
        };

        for _ in 0..7 {
            logger.log(&entry).unwrap();
        }

        let mut files = logger.log_files().unwrap();
        files.sort();
        assert_eq!(files.len(), 2);
        assert_eq!(read_lines(&files[0]).len(), 2);
        assert_eq!(read_lines(&files[1]).len(), 1);
    }

    #[test]
    fn test_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let mut logger = EventLogger::new(dir.path(), 1, 1).unwrap();

        logger.log(&LogEntry::NegotiationFailed).unwrap();
        logger.log(&LogEntry::NegotiationFailed).unwrap();

        assert_eq!(logger.log_files().unwrap().len(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }
}
