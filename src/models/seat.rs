use std::fmt;

use super::event::Event;

/// Prefix that puts a seat in the VIP price tier.
pub const VIP_PREFIX: &str = "VIP";

/// Price tier of a seat, derived from its identifier alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeatClass {
    Vip,
    /// Standard tier, labelled by the leading letter of the seat's row.
    Standard(char),
}

impl SeatClass {
    /// Classifies a seat identifier. Returns `None` for an empty identifier.
    pub fn of(seat: &str) -> Option<Self> {
        if seat.starts_with(VIP_PREFIX) {
            return Some(SeatClass::Vip);
        }
        seat.chars().next().map(SeatClass::Standard)
    }

    /// Ticket type label shown to the customer and written to the log.
    pub fn ticket_type(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatClass::Vip => f.write_str(VIP_PREFIX),
            SeatClass::Standard(row) => write!(f, "standard {}", row),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatStatus {
    Available,
    Reserved,
}

/// Fixed grid of seat identifiers shared by every event. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatingLayout {
    rows: Vec<Vec<String>>,
}

impl SeatingLayout {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Four standard rows `A`-`D` of eight seats, then two VIP rows `VIP1`-`VIP16`.
    pub fn standard() -> Self {
        let mut rows: Vec<Vec<String>> = ['A', 'B', 'C', 'D']
            .iter()
            .map(|row| (1..=8).map(|n| format!("{}{}", row, n)).collect())
            .collect();
        rows.push((1..=8).map(|n| format!("{}{}", VIP_PREFIX, n)).collect());
        rows.push((9..=16).map(|n| format!("{}{}", VIP_PREFIX, n)).collect());
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn contains(&self, seat: &str) -> bool {
        self.seats().any(|s| s == seat)
    }

    pub fn seats(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }

    /// Layout rows annotated with each seat's availability for `event`.
    pub fn seat_map<'a>(&'a self, event: &Event) -> Vec<Vec<(&'a str, SeatStatus)>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|seat| {
                        let status = if event.is_reserved(seat) {
                            SeatStatus::Reserved
                        } else {
                            SeatStatus::Available
                        };
                        (seat.as_str(), status)
                    })
                    .collect()
            })
            .collect()
    }
}

impl Default for SeatingLayout {
    fn default() -> Self {
        Self::standard()
    }
}
