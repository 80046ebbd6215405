pub mod reservation;

pub use reservation::{CommitResult, LogOutcome, ReservationService, SessionStage};
