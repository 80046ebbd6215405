//! Append-only audit log of committed reservations, one JSON object per line.
//!
//! The core only ever appends; `list_committed` exists for inspection and tests.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::LogError;
use crate::models::CommittedReservation;

#[derive(Debug, Clone)]
pub struct ReservationLog {
    path: PathBuf,
}

impl ReservationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, reservation: &CommittedReservation) -> Result<(), LogError> {
        let mut line = serde_json::to_string(reservation)?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        // Single write so a line is never interleaved with another appender's.
        file.write_all(line.as_bytes()).map_err(|e| self.io_error(e))?;
        file.sync_data().map_err(|e| self.io_error(e))?;

        debug!("Appended reservation {} to {}", reservation.id, self.path.display());
        Ok(())
    }

    /// Every committed reservation in append order. A missing log is empty.
    pub fn list_committed(&self) -> Result<Vec<CommittedReservation>, LogError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut committed = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let reservation = serde_json::from_str(&line)
                .map_err(|source| LogError::Corrupt { line: idx + 1, source })?;
            committed.push(reservation);
        }
        Ok(committed)
    }

    fn io_error(&self, source: io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn committed(customer: &str, seat: &str) -> CommittedReservation {
        CommittedReservation {
            id: Uuid::new_v4(),
            event_name: "Concert".to_string(),
            seat: seat.to_string(),
            ticket_type: "standard A".to_string(),
            total_cost: 20.0,
            customer_name: customer.to_string(),
            committed_at: Utc::now(),
        }
    }

    #[test]
    fn missing_log_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReservationLog::new(dir.path().join("reservations.jsonl"));
        assert!(log.list_committed().unwrap().is_empty());
    }

    #[test]
    fn appends_in_order_and_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReservationLog::new(dir.path().join("data").join("reservations.jsonl"));

        let first = committed("Alice", "A1");
        let second = committed("Bob", "A2");
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        assert_eq!(log.list_committed().unwrap(), vec![first, second]);
    }

    #[test]
    fn corrupt_entry_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reservations.jsonl");
        let log = ReservationLog::new(&path);
        log.append(&committed("Alice", "A1")).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();

        assert!(matches!(log.list_committed(), Err(LogError::Corrupt { line: 2, .. })));
    }

    #[test]
    fn unwritable_location_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // The log path is an existing directory, so it cannot be opened for append.
        let log = ReservationLog::new(dir.path());
        assert!(matches!(log.append(&committed("Alice", "A1")), Err(LogError::Io { .. })));
    }
}
