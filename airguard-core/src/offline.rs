//! Hour-Bucketed Offline Log
//!
//! While the wireless link is down, readings go to plain text files on the
//! node's own storage instead of the broker:
//!
//! ```text
//! <root>/offline.dat        rotation sequence, a single integer
//! <root>/off_<seq>_<hh>.log one file per sequence and UTC hour
//! ```
//!
//! Each line is `HH:MM:SS\t<metric>\t<value>` with the value to two
//! decimals. Every start picks the next of ten sequence numbers and clears
//! that sequence's hour files, so ten restarts' worth of data are kept.
//!
//! Buffering is opt-in: without an `offline.dat` the node keeps no local
//! copy. Nothing here is ever replayed to the broker.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Timelike, Utc};
use thiserror_no_std::Error;

use crate::constants::conditioning::PAYLOAD_DECIMALS;
use crate::constants::offline::{
    HOURS_PER_DAY, LOG_FILE_PREFIX, LOG_FILE_SUFFIX, ROTATION_SEQUENCES, SEQUENCE_FILE,
};
use crate::time::Timestamp;
use crate::traits::OfflineSink;

/// Offline storage failure
#[derive(Error, Debug)]
pub enum OfflineError {
    /// Filesystem operation failed
    #[error("offline storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Timestamp cannot be placed on a calendar
    #[error("timestamp {0}ms is out of range")]
    BadTimestamp(Timestamp),
}

/// File name for one sequence and hour, e.g. `off_3_07.log`
pub fn log_file_name(sequence: u8, hour: u32) -> String {
    format!("{}{}_{:02}{}", LOG_FILE_PREFIX, sequence, hour, LOG_FILE_SUFFIX)
}

/// Appends readings to the current hour's file
#[derive(Debug)]
pub struct OfflineBuffer {
    root: PathBuf,
    sequence: u8,
    current: Option<(u32, File)>,
}

impl OfflineBuffer {
    /// Start a new rotation under `root`
    ///
    /// Returns `Ok(None)` when `root` has no sequence file, meaning offline
    /// buffering is not wanted. An unreadable sequence file clears every
    /// offline log and restarts the rotation at 0.
    pub fn activate(root: impl AsRef<Path>) -> Result<Option<Self>, OfflineError> {
        let root = root.as_ref().to_path_buf();
        let counter = root.join(SEQUENCE_FILE);

        let text = match fs::read_to_string(&counter) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let sequence = match text.trim().parse::<u32>() {
            Ok(previous) => {
                let rotation = u32::from(ROTATION_SEQUENCES);
                let sequence = ((previous % rotation + 1) % rotation) as u8;
                remove_sequence(&root, sequence)?;
                sequence
            }
            Err(_) => {
                remove_all_logs(&root)?;
                0
            }
        };

        fs::write(&counter, sequence.to_string())?;

        Ok(Some(Self {
            root,
            sequence,
            current: None,
        }))
    }

    /// Rotation sequence in use
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Path of the file for `hour` in this rotation
    pub fn path_for_hour(&self, hour: u32) -> PathBuf {
        self.root.join(log_file_name(self.sequence, hour))
    }

    fn file_for_hour(&mut self, hour: u32) -> Result<&mut File, OfflineError> {
        let file = match self.current.take() {
            Some((open_hour, file)) if open_hour == hour => file,
            _ => OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path_for_hour(hour))?,
        };
        let (_, file) = self.current.insert((hour, file));
        Ok(file)
    }
}

impl OfflineSink for OfflineBuffer {
    type Error = OfflineError;

    fn append(&mut self, at: Timestamp, metric: &str, value: f32) -> Result<(), Self::Error> {
        let millis = i64::try_from(at).map_err(|_| OfflineError::BadTimestamp(at))?;
        let time: DateTime<Utc> =
            DateTime::from_timestamp_millis(millis).ok_or(OfflineError::BadTimestamp(at))?;

        let file = self.file_for_hour(time.hour())?;
        writeln!(
            file,
            "{:02}:{:02}:{:02}\t{}\t{:.*}",
            time.hour(),
            time.minute(),
            time.second(),
            metric,
            PAYLOAD_DECIMALS,
            value
        )?;
        Ok(())
    }
}

fn remove_sequence(root: &Path, sequence: u8) -> io::Result<()> {
    for hour in 0..u32::from(HOURS_PER_DAY) {
        match fs::remove_file(root.join(log_file_name(sequence, hour))) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn remove_all_logs(root: &Path) -> io::Result<()> {
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(LOG_FILE_PREFIX) && name.ends_with(LOG_FILE_SUFFIX) {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // 2024-03-01T07:05:09Z
    const MORNING: Timestamp = 1_709_276_709_000;

    fn activated(dir: &TempDir, counter: &str) -> OfflineBuffer {
        fs::write(dir.path().join(SEQUENCE_FILE), counter).unwrap();
        OfflineBuffer::activate(dir.path()).unwrap().unwrap()
    }

    #[test]
    fn missing_counter_disables_buffering() {
        let dir = TempDir::new().unwrap();
        assert!(OfflineBuffer::activate(dir.path()).unwrap().is_none());
    }

    #[test]
    fn sequence_advances_and_wraps() {
        let dir = TempDir::new().unwrap();
        assert_eq!(activated(&dir, "3\n").sequence(), 4);
        assert_eq!(activated(&dir, "9").sequence(), 0);

        let stored = fs::read_to_string(dir.path().join(SEQUENCE_FILE)).unwrap();
        assert_eq!(stored, "0");
    }

    #[test]
    fn largest_counter_still_advances() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("off_6_02.log"), "old").unwrap();

        assert_eq!(activated(&dir, "4294967295").sequence(), 6);
        assert!(!dir.path().join("off_6_02.log").exists());
    }

    #[test]
    fn activation_clears_only_reused_sequence() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("off_4_13.log"), "old").unwrap();
        fs::write(dir.path().join("off_5_13.log"), "keep").unwrap();

        activated(&dir, "3");

        assert!(!dir.path().join("off_4_13.log").exists());
        assert!(dir.path().join("off_5_13.log").exists());
    }

    #[test]
    fn corrupt_counter_clears_every_log() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("off_1_00.log"), "x").unwrap();
        fs::write(dir.path().join("off_8_23.log"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let buffer = activated(&dir, "");

        assert_eq!(buffer.sequence(), 0);
        assert!(!dir.path().join("off_1_00.log").exists());
        assert!(!dir.path().join("off_8_23.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn lines_go_to_the_hour_file() {
        let dir = TempDir::new().unwrap();
        let mut buffer = activated(&dir, "0");

        buffer.append(MORNING, "PMVT", 23.4).unwrap();
        buffer.append(MORNING + 30_000, "PMVT", 7.0).unwrap();

        let text = fs::read_to_string(buffer.path_for_hour(7)).unwrap();
        assert_eq!(text, "07:05:09\tPMVT\t23.40\n07:05:39\tPMVT\t7.00\n");
    }

    #[test]
    fn rolls_over_on_hour_boundary() {
        let dir = TempDir::new().unwrap();
        let mut buffer = activated(&dir, "0");

        buffer.append(MORNING, "PMVT", 1.0).unwrap();
        // 08:00:00
        buffer.append(MORNING + 3_291_000, "PMVT", 2.0).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("off_1_07.log")).unwrap(),
            "07:05:09\tPMVT\t1.00\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("off_1_08.log")).unwrap(),
            "08:00:00\tPMVT\t2.00\n"
        );
    }

    #[test]
    fn file_name_pads_hour() {
        assert_eq!(log_file_name(3, 7), "off_3_07.log");
        assert_eq!(log_file_name(0, 23), "off_0_23.log");
    }
}
