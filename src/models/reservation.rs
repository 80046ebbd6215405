use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::seat::SeatClass;

/// How far an in-progress reservation has advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStage {
    EventChosen,
    SeatChosen,
}

#[derive(Debug, Clone, PartialEq)]
struct SeatSelection {
    seat: String,
    class: SeatClass,
    total_cost: f64,
}

/// A booking being assembled: bound to one event, optionally holding a seat.
///
/// Only the reservation service moves it forward; the finalized form is
/// [`CommittedReservation`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    id: Uuid,
    event_name: String,
    selection: Option<SeatSelection>,
}

impl Reservation {
    pub(crate) fn for_event(event_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_name: event_name.into(),
            selection: None,
        }
    }

    pub(crate) fn with_seat(&self, seat: &str, class: SeatClass, total_cost: f64) -> Self {
        Self {
            id: self.id,
            event_name: self.event_name.clone(),
            selection: Some(SeatSelection {
                seat: seat.to_string(),
                class,
                total_cost,
            }),
        }
    }

    /// Stays the same across seat selections and becomes the committed id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn selected_seat(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.seat.as_str())
    }

    pub fn seat_class(&self) -> Option<SeatClass> {
        self.selection.as_ref().map(|s| s.class)
    }

    pub fn ticket_type(&self) -> Option<String> {
        self.seat_class().map(|class| class.ticket_type())
    }

    pub fn total_cost(&self) -> Option<f64> {
        self.selection.as_ref().map(|s| s.total_cost)
    }

    pub fn stage(&self) -> ReservationStage {
        match self.selection {
            Some(_) => ReservationStage::SeatChosen,
            None => ReservationStage::EventChosen,
        }
    }

    /// Label/value pairs for the confirmation screen. Missing values render empty.
    /// The customer row is only known once committed, see [`CommittedReservation::details`].
    pub fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Event:", self.event_name.clone()),
            ("Selected seat:", self.selected_seat().unwrap_or_default().to_string()),
            ("Ticket type:", self.ticket_type().unwrap_or_default()),
            (
                "Total cost:",
                self.total_cost().map(format_cost).unwrap_or_default(),
            ),
        ]
    }

    pub(crate) fn finalize(
        &self,
        customer_name: &str,
        committed_at: DateTime<Utc>,
    ) -> Option<CommittedReservation> {
        let selection = self.selection.as_ref()?;
        Some(CommittedReservation {
            id: self.id,
            event_name: self.event_name.clone(),
            seat: selection.seat.clone(),
            ticket_type: selection.class.ticket_type(),
            total_cost: selection.total_cost,
            customer_name: customer_name.to_string(),
            committed_at,
        })
    }
}

/// A confirmed booking as written to the reservation log. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedReservation {
    pub id: Uuid,
    pub event_name: String,
    pub seat: String,
    pub ticket_type: String,
    pub total_cost: f64,
    pub customer_name: String,
    pub committed_at: DateTime<Utc>,
}

impl CommittedReservation {
    // Customer first, then the same rows as the confirmation screen
    pub fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Customer name:", self.customer_name.clone()),
            ("Event:", self.event_name.clone()),
            ("Selected seat:", self.seat.clone()),
            ("Ticket type:", self.ticket_type.clone()),
            ("Total cost:", format_cost(self.total_cost)),
        ]
    }
}

impl fmt::Display for CommittedReservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} booked {} ({}) for {} at {} on {}",
            self.customer_name,
            self.seat,
            self.ticket_type,
            self.event_name,
            format_cost(self.total_cost),
            self.committed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}

fn format_cost(cost: f64) -> String {
    format!("{:.2}", cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fresh_reservation_has_no_seat() {
        let r = Reservation::for_event("Concert");
        assert_eq!(r.stage(), ReservationStage::EventChosen);
        assert_eq!(r.selected_seat(), None);
        assert_eq!(r.total_cost(), None);
        assert!(r.finalize("Alice", Utc::now()).is_none());
    }

    #[test]
    fn seat_selection_derives_type_and_cost() {
        let r = Reservation::for_event("Concert").with_seat("B4", SeatClass::Standard('B'), 20.0);
        assert_eq!(r.stage(), ReservationStage::SeatChosen);
        assert_eq!(r.ticket_type().as_deref(), Some("standard B"));
        assert_eq!(r.total_cost(), Some(20.0));
    }

    #[test]
    fn seat_selection_keeps_reservation_identity() {
        let r = Reservation::for_event("Concert");
        let seated = r.with_seat("A1", SeatClass::Standard('A'), 20.0);
        assert_eq!(seated.id(), r.id());
        assert_ne!(Reservation::for_event("Concert").id(), r.id());
        assert_eq!(seated.finalize("Alice", Utc::now()).unwrap().id, r.id());
    }

    #[test]
    fn details_render_in_screen_order() {
        let r = Reservation::for_event("Concert").with_seat("VIP1", SeatClass::Vip, 50.0);
        let details = r.details();
        assert_eq!(details[0], ("Event:", "Concert".to_string()));
        assert_eq!(details[1], ("Selected seat:", "VIP1".to_string()));
        assert_eq!(details[2], ("Ticket type:", "VIP".to_string()));
        assert_eq!(details[3], ("Total cost:", "50.00".to_string()));
    }

    #[test]
    fn finalize_copies_selection_and_customer() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap();
        let committed = Reservation::for_event("Concert")
            .with_seat("VIP1", SeatClass::Vip, 50.0)
            .finalize("Alice", at)
            .unwrap();

        assert_eq!(committed.customer_name, "Alice");
        assert_eq!(committed.ticket_type, "VIP");
        assert_eq!(
            committed.details(),
            vec![
                ("Customer name:", "Alice".to_string()),
                ("Event:", "Concert".to_string()),
                ("Selected seat:", "VIP1".to_string()),
                ("Ticket type:", "VIP".to_string()),
                ("Total cost:", "50.00".to_string()),
            ]
        );
        assert_eq!(committed.total_cost, 50.0);
        assert_eq!(
            committed.to_string(),
            "Alice booked VIP1 (VIP) for Concert at 50.00 on 2024-05-01 18:30:00 UTC"
        );
    }
}
