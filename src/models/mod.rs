pub mod event;
pub mod reservation;
pub mod seat;

pub use event::Event;
pub use reservation::{CommittedReservation, Reservation, ReservationStage};
pub use seat::{SeatClass, SeatStatus, SeatingLayout};
