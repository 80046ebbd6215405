//! reservation.rs
//!
//! Business rules of a booking session: event selection, seat availability,
//! price derivation and committing a reservation to the catalog and the log.
//!
//! The service owns the session state the presentation layer works against.
//! A session moves `Empty -> EventChosen -> SeatChosen -> Confirmed`; `cancel`
//! drops an unconfirmed reservation but never un-reserves a committed seat.
//! Only the session's in-progress reservation can be moved forward, so a
//! confirmed or cancelled one stays where it is.

use chrono::Utc;
use tracing::{debug, error, info};

use crate::catalog::{EventStore, SeatMark};
use crate::error::{LogError, ReservationError, StoreError, ValidationError};
use crate::models::{CommittedReservation, Event, Reservation, ReservationStage, SeatClass, SeatingLayout};
use crate::reservation_log::ReservationLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    Empty,
    EventChosen,
    SeatChosen,
    Confirmed,
}

/// Whether the committed reservation also reached the reservation log.
#[derive(Debug, Clone, PartialEq)]
pub enum LogOutcome {
    Recorded,
    /// The seat is reserved in the catalog but the audit entry was lost.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitResult {
    pub reservation: CommittedReservation,
    pub log_outcome: LogOutcome,
}

#[derive(Debug, Default)]
enum Session {
    #[default]
    Empty,
    InProgress {
        event: Event,
        reservation: Reservation,
    },
    Confirmed(CommittedReservation),
}

#[derive(Debug)]
pub struct ReservationService {
    store: EventStore,
    log: ReservationLog,
    session: Session,
    has_loaded: bool,
}

impl ReservationService {
    pub fn new(store: EventStore, log: ReservationLog) -> Self {
        Self {
            store,
            log,
            session: Session::Empty,
            has_loaded: false,
        }
    }

    pub fn layout(&self) -> &SeatingLayout {
        self.store.layout()
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Reloads the catalog. Nothing is cached between calls.
    ///
    /// An I/O failure before any load has succeeded is reported as the fatal
    /// [`ReservationError::CatalogUnavailable`].
    pub fn list_events(&mut self) -> Result<Vec<Event>, ReservationError> {
        match self.store.load_all() {
            Ok(events) => {
                self.has_loaded = true;
                Ok(events)
            }
            Err(err @ StoreError::Io { .. }) if !self.has_loaded => {
                error!("Event catalog unreadable at startup: {}", err);
                Err(ReservationError::CatalogUnavailable(err))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn find_event(&mut self, name: &str) -> Result<Event, ReservationError> {
        self.list_events()?
            .into_iter()
            .find(|event| event.name == name)
            .ok_or_else(|| ReservationError::NotFound {
                event: name.to_string(),
            })
    }

    /// Starts a fresh reservation for `event`, replacing any unconfirmed one.
    pub fn select_event(&mut self, event: &Event) -> Reservation {
        let reservation = Reservation::for_event(&event.name);
        self.session = Session::InProgress {
            event: event.clone(),
            reservation: reservation.clone(),
        };
        debug!("Selected event {}", event.name);
        reservation
    }

    /// Puts `seat` on the reservation and derives its ticket type and cost.
    pub fn select_seat(
        &mut self,
        event: &Event,
        reservation: &Reservation,
        seat: &str,
    ) -> Result<Reservation, ReservationError> {
        self.ensure_current(reservation)?;
        if reservation.event_name() != event.name {
            return Err(ValidationError::EventMismatch {
                reservation: reservation.event_name().to_string(),
                event: event.name.clone(),
            }
            .into());
        }
        if event.is_reserved(seat) {
            return Err(ReservationError::SeatUnavailable {
                event: event.name.clone(),
                seat: seat.to_string(),
            });
        }
        let class = match SeatClass::of(seat) {
            Some(class) if self.layout().contains(seat) => class,
            _ => return Err(ValidationError::UnknownSeat(seat.to_string()).into()),
        };

        let updated = reservation.with_seat(seat, class, event.price_for(class));
        self.session = Session::InProgress {
            event: event.clone(),
            reservation: updated.clone(),
        };
        debug!("Selected seat {} ({}) for {}", seat, class, event.name);
        Ok(updated)
    }

    /// Commits the reservation under `customer_name`.
    ///
    /// Availability is checked again against the catalog on disk before the
    /// seat is marked. A failed log append does not undo the commit; it is
    /// reported through [`CommitResult::log_outcome`].
    pub fn confirm(
        &mut self,
        reservation: &Reservation,
        customer_name: &str,
    ) -> Result<CommitResult, ReservationError> {
        let customer_name = customer_name.trim();
        if customer_name.is_empty() {
            return Err(ValidationError::BlankCustomerName.into());
        }
        self.ensure_current(reservation)?;
        if reservation.stage() != ReservationStage::SeatChosen {
            return Err(ValidationError::SeatNotChosen.into());
        }
        let committed = reservation
            .finalize(customer_name, Utc::now())
            .ok_or(ValidationError::SeatNotChosen)?;

        let unavailable = || ReservationError::SeatUnavailable {
            event: committed.event_name.clone(),
            seat: committed.seat.clone(),
        };

        let current = self.store.find(&committed.event_name)?;
        if current.is_reserved(&committed.seat) {
            return Err(unavailable());
        }
        if self.store.mark_seat_reserved(&committed.event_name, &committed.seat)?
            == SeatMark::AlreadyReserved
        {
            return Err(unavailable());
        }

        let log_outcome = match self.log.append(&committed) {
            Ok(()) => LogOutcome::Recorded,
            Err(err) => {
                error!(
                    "Reservation {} committed but not logged: {}",
                    committed.id, err
                );
                LogOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        info!(
            "Reservation {} confirmed: {} seat {} for {}",
            committed.id, committed.event_name, committed.seat, committed.customer_name
        );
        self.session = Session::Confirmed(committed.clone());

        Ok(CommitResult {
            reservation: committed,
            log_outcome,
        })
    }

    fn ensure_current(&self, reservation: &Reservation) -> Result<(), ValidationError> {
        match &self.session {
            Session::InProgress { reservation: current, .. } if current.id() == reservation.id() => {
                Ok(())
            }
            _ => Err(ValidationError::StaleReservation),
        }
    }

    /// Drops the in-progress reservation. Committed seats stay reserved.
    pub fn cancel(&mut self) {
        if let Session::InProgress { event, .. } = &self.session {
            debug!("Cancelled reservation for {}", event.name);
        }
        self.session = Session::Empty;
    }

    pub fn stage(&self) -> SessionStage {
        match &self.session {
            Session::Empty => SessionStage::Empty,
            Session::InProgress { reservation, .. } => match reservation.stage() {
                ReservationStage::EventChosen => SessionStage::EventChosen,
                ReservationStage::SeatChosen => SessionStage::SeatChosen,
            },
            Session::Confirmed(_) => SessionStage::Confirmed,
        }
    }

    pub fn selected_event(&self) -> Option<&Event> {
        match &self.session {
            Session::InProgress { event, .. } => Some(event),
            _ => None,
        }
    }

    pub fn current_reservation(&self) -> Option<&Reservation> {
        match &self.session {
            Session::InProgress { reservation, .. } => Some(reservation),
            _ => None,
        }
    }

    pub fn last_commit(&self) -> Option<&CommittedReservation> {
        match &self.session {
            Session::Confirmed(committed) => Some(committed),
            _ => None,
        }
    }

    pub fn list_committed(&self) -> Result<Vec<CommittedReservation>, LogError> {
        self.log.list_committed()
    }
}
