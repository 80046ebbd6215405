use std::collections::BTreeSet;

use super::seat::SeatClass;

/// One bookable event with its price tiers and reserved seats.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub price_standard: f64,
    pub price_vip: f64,
    pub reserved_seats: BTreeSet<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, price_standard: f64, price_vip: f64) -> Self {
        Self {
            name: name.into(),
            price_standard,
            price_vip,
            reserved_seats: BTreeSet::new(),
        }
    }

    pub fn with_reserved<I, S>(mut self, seats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_seats.extend(seats.into_iter().map(Into::into));
        self
    }

    pub fn is_reserved(&self, seat: &str) -> bool {
        self.reserved_seats.contains(seat)
    }

    /// Adds `seat` to the reserved set. Returns `false` if it was already there.
    pub fn reserve(&mut self, seat: impl Into<String>) -> bool {
        self.reserved_seats.insert(seat.into())
    }

    pub fn price_for(&self, class: SeatClass) -> f64 {
        match class {
            SeatClass::Vip => self.price_vip,
            SeatClass::Standard(_) => self.price_standard,
        }
    }

    // "Reserved seats: A1, VIP3"
    pub fn reserved_seats_label(&self) -> String {
        let seats: Vec<&str> = self.reserved_seats.iter().map(String::as_str).collect();
        format!("Reserved seats: {}", seats.join(", "))
    }
}
