use std::path::PathBuf;
use thiserror::Error;

/// Failures of the event catalog file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt catalog record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("event '{event}' not found in catalog")]
    NotFound { event: String },

    #[error("event cannot be written to the catalog: {reason}")]
    InvalidRecord { reason: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the append-only reservation log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("reservation log I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode reservation: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("corrupt reservation log entry at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Input the user can fix and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("customer name must not be empty")]
    BlankCustomerName,

    #[error("seat '{0}' is not part of the seating layout")]
    UnknownSeat(String),

    #[error("reservation is for '{reservation}', not '{event}'")]
    EventMismatch { reservation: String, event: String },

    #[error("no seat has been selected")]
    SeatNotChosen,

    /// The reservation was already confirmed, cancelled or replaced.
    #[error("reservation is no longer in progress")]
    StaleReservation,
}

/// Errors surfaced to the presentation layer by the reservation service.
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("event catalog is corrupt: {0}")]
    StoreCorrupt(#[source] StoreError),

    #[error("event '{event}' no longer exists")]
    NotFound { event: String },

    #[error("seat {seat} is already reserved for {event}")]
    SeatUnavailable { event: String, seat: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The catalog could not be read and no earlier load succeeded.
    #[error("event catalog unavailable: {0}")]
    CatalogUnavailable(#[source] StoreError),

    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl ReservationError {
    /// Only an unreadable catalog with nothing loaded before stops the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReservationError::CatalogUnavailable(_))
    }
}

impl From<StoreError> for ReservationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { event } => ReservationError::NotFound { event },
            err @ StoreError::Corrupt { .. } => ReservationError::StoreCorrupt(err),
            other => ReservationError::Storage(other),
        }
    }
}
