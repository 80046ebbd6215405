//! catalog.rs
//!
//! Flat-file event catalog and its line codec.
//!
//! One event per line:
//!
//! ```text
//! # name|standard price|VIP price|reserved seats
//! Concert|20|50|A1,VIP3
//! ```
//!
//! Fields are separated by `|`, reserved seats by `,`. Blank lines and lines
//! starting with `#` carry no event and are kept verbatim when the file is
//! rewritten. Every mutation rewrites the whole file through a temporary file
//! in the same directory followed by a rename, so readers see either the old
//! catalog or the new one.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::{Event, SeatingLayout};

pub const FIELD_DELIMITER: char = '|';
pub const SEAT_DELIMITER: char = ',';
pub const COMMENT_PREFIX: char = '#';

const FIELD_COUNT: usize = 4;

/// What `load_all` does with a record it cannot decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptRecordPolicy {
    /// Fail the whole load.
    #[default]
    Abort,
    /// Log a warning and leave the record out. It is still preserved on rewrite.
    Skip,
}

impl FromStr for CorruptRecordPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(CorruptRecordPolicy::Abort),
            "skip" => Ok(CorruptRecordPolicy::Skip),
            other => Err(format!("expected 'abort' or 'skip', got '{}'", other)),
        }
    }
}

/// Outcome of a successful `mark_seat_reserved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatMark {
    Added,
    /// The seat was reserved already; the file was left untouched.
    AlreadyReserved,
}

/// One physical line of the catalog file, line ending included.
#[derive(Debug)]
enum CatalogLine<'a> {
    Passthrough(&'a str),
    Record { raw: &'a str, event: Event },
    Corrupt { raw: &'a str, line: usize, reason: String },
}

#[derive(Debug, Clone)]
pub struct EventStore {
    path: PathBuf,
    layout: SeatingLayout,
    policy: CorruptRecordPolicy,
}

impl EventStore {
    pub fn new(path: impl Into<PathBuf>, layout: SeatingLayout, policy: CorruptRecordPolicy) -> Self {
        Self {
            path: path.into(),
            layout,
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &SeatingLayout {
        &self.layout
    }

    pub fn policy(&self) -> CorruptRecordPolicy {
        self.policy
    }

    /// Reads every event in the catalog, in file order.
    pub fn load_all(&self) -> Result<Vec<Event>, StoreError> {
        let text = self.read()?;
        let lines = self.parse(&text)?;

        let events: Vec<Event> = lines
            .into_iter()
            .filter_map(|line| match line {
                CatalogLine::Record { event, .. } => Some(event),
                _ => None,
            })
            .collect();

        info!("Loaded {} events from {}", events.len(), self.path.display());
        Ok(events)
    }

    pub fn find(&self, event_name: &str) -> Result<Event, StoreError> {
        self.load_all()?
            .into_iter()
            .find(|event| event.name == event_name)
            .ok_or_else(|| StoreError::NotFound {
                event: event_name.to_string(),
            })
    }

    /// Adds `seat` to the reserved set of `event_name` and rewrites the catalog.
    ///
    /// Re-marking a reserved seat succeeds without writing. An unknown event
    /// fails with [`StoreError::NotFound`] and leaves the file as it was.
    pub fn mark_seat_reserved(&self, event_name: &str, seat: &str) -> Result<SeatMark, StoreError> {
        if !self.layout.contains(seat) {
            return Err(StoreError::InvalidRecord {
                reason: format!("seat '{}' is not part of the seating layout", seat),
            });
        }

        let text = self.read()?;
        let lines = self.parse(&text)?;

        let mut found = false;
        let mut out = String::with_capacity(text.len() + seat.len() + 1);

        for line in &lines {
            match line {
                CatalogLine::Record { raw, event } if event.name == event_name => {
                    if event.is_reserved(seat) {
                        debug!("Seat {} already reserved for {}, nothing to write", seat, event_name);
                        return Ok(SeatMark::AlreadyReserved);
                    }
                    found = true;
                    out.push_str(&append_seat(raw, seat));
                }
                CatalogLine::Record { raw, .. }
                | CatalogLine::Corrupt { raw, .. }
                | CatalogLine::Passthrough(raw) => out.push_str(raw),
            }
        }

        if !found {
            return Err(StoreError::NotFound {
                event: event_name.to_string(),
            });
        }

        self.write_atomic(&out)?;
        info!("Marked seat {} reserved for {}", seat, event_name);
        Ok(SeatMark::Added)
    }

    /// Replaces the whole catalog with `events`.
    pub fn save_all(&self, events: &[Event]) -> Result<(), StoreError> {
        let text = encode_catalog(events, &self.layout)?;
        self.write_atomic(&text)?;
        info!("Wrote {} events to {}", events.len(), self.path.display());
        Ok(())
    }

    fn read(&self) -> Result<String, StoreError> {
        fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))
    }

    fn parse<'a>(&self, text: &'a str) -> Result<Vec<CatalogLine<'a>>, StoreError> {
        let lines = parse_lines(text, &self.layout);

        for line in &lines {
            if let CatalogLine::Corrupt { line, reason, .. } = line {
                match self.policy {
                    CorruptRecordPolicy::Abort => {
                        return Err(StoreError::Corrupt {
                            line: *line,
                            reason: reason.clone(),
                        });
                    }
                    CorruptRecordPolicy::Skip => {
                        warn!("Skipping corrupt catalog record at line {}: {}", line, reason);
                    }
                }
            }
        }

        Ok(lines)
    }

    fn write_atomic(&self, contents: &str) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        temp.write_all(contents.as_bytes())
            .map_err(|e| StoreError::io(temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;
        Ok(())
    }
}

fn parse_lines<'a>(text: &'a str, layout: &SeatingLayout) -> Vec<CatalogLine<'a>> {
    let mut seen: HashSet<String> = HashSet::new();

    text.split_inclusive('\n')
        .enumerate()
        .map(|(idx, raw)| {
            let content = strip_line_ending(raw);
            let trimmed = content.trim();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
                return CatalogLine::Passthrough(raw);
            }

            let line = idx + 1;
            match decode_record(content, layout) {
                Ok(event) if !seen.insert(event.name.clone()) => CatalogLine::Corrupt {
                    raw,
                    line,
                    reason: format!("duplicate event name '{}'", event.name),
                },
                Ok(event) => CatalogLine::Record { raw, event },
                Err(reason) => CatalogLine::Corrupt { raw, line, reason },
            }
        })
        .collect()
}

fn strip_line_ending(raw: &str) -> &str {
    let content = raw.strip_suffix('\n').unwrap_or(raw);
    content.strip_suffix('\r').unwrap_or(content)
}

/// Rewrites only the seat field of a record line, keeping every other byte.
fn append_seat(raw: &str, seat: &str) -> String {
    let content = strip_line_ending(raw);
    let ending = &raw[content.len()..];

    // `raw` was decoded successfully, so it has exactly FIELD_COUNT fields.
    let (head, seats) = content
        .rsplit_once(FIELD_DELIMITER)
        .unwrap_or((content, ""));
    let existing = seats.trim().trim_end_matches(SEAT_DELIMITER);

    if existing.is_empty() {
        format!("{}{}{}{}", head, FIELD_DELIMITER, seat, ending)
    } else {
        format!(
            "{}{}{}{}{}{}",
            head, FIELD_DELIMITER, existing, SEAT_DELIMITER, seat, ending
        )
    }
}

/// Decodes one record line (without its line ending). Errors carry the reason.
pub fn decode_record(line: &str, layout: &SeatingLayout) -> Result<Event, String> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return Err(format!(
            "expected {} fields separated by '{}', found {}",
            FIELD_COUNT,
            FIELD_DELIMITER,
            fields.len()
        ));
    }

    let name = fields[0].trim();
    if name.is_empty() {
        return Err("event name is empty".to_string());
    }

    let price_standard = parse_price(fields[1], "standard")?;
    let price_vip = parse_price(fields[2], "VIP")?;

    let mut event = Event::new(name, price_standard, price_vip);
    for seat in fields[3].split(SEAT_DELIMITER).map(str::trim).filter(|s| !s.is_empty()) {
        if !layout.contains(seat) {
            return Err(format!("reserved seat '{}' is not part of the seating layout", seat));
        }
        event.reserve(seat);
    }

    Ok(event)
}

fn parse_price(field: &str, tier: &str) -> Result<f64, String> {
    let value: f64 = field
        .trim()
        .parse()
        .map_err(|_| format!("{} price '{}' is not a number", tier, field.trim()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} price '{}' must be a non-negative number", tier, field.trim()));
    }
    Ok(value)
}

/// Encodes one event as a record line, without line ending.
pub fn encode_record(event: &Event, layout: &SeatingLayout) -> Result<String, StoreError> {
    let invalid = |reason: String| StoreError::InvalidRecord { reason };

    if event.name.is_empty() || event.name.trim() != event.name {
        return Err(invalid(format!(
            "event name '{}' must be non-empty without surrounding whitespace",
            event.name
        )));
    }
    if event.name.contains(FIELD_DELIMITER) || event.name.contains(['\n', '\r']) {
        return Err(invalid(format!(
            "event name '{}' contains '{}' or a line break",
            event.name, FIELD_DELIMITER
        )));
    }
    if event.name.starts_with(COMMENT_PREFIX) {
        return Err(invalid(format!(
            "event name '{}' starts with '{}'",
            event.name, COMMENT_PREFIX
        )));
    }
    for price in [event.price_standard, event.price_vip] {
        if !price.is_finite() || price < 0.0 {
            return Err(invalid(format!(
                "price {} of '{}' must be a non-negative number",
                price, event.name
            )));
        }
    }
    if let Some(seat) = event.reserved_seats.iter().find(|s| !layout.contains(s)) {
        return Err(invalid(format!(
            "reserved seat '{}' of '{}' is not part of the seating layout",
            seat, event.name
        )));
    }

    let seats: Vec<&str> = event.reserved_seats.iter().map(String::as_str).collect();
    let seat_delimiter = SEAT_DELIMITER.to_string();
    Ok(format!(
        "{name}{d}{std}{d}{vip}{d}{seats}",
        name = event.name,
        d = FIELD_DELIMITER,
        std = event.price_standard,
        vip = event.price_vip,
        seats = seats.join(seat_delimiter.as_str()),
    ))
}

/// Encodes a full catalog, one record per line. Event names must be unique.
pub fn encode_catalog(events: &[Event], layout: &SeatingLayout) -> Result<String, StoreError> {
    let mut seen = HashSet::new();
    let mut out = String::new();
    for event in events {
        if !seen.insert(event.name.as_str()) {
            return Err(StoreError::InvalidRecord {
                reason: format!("duplicate event name '{}'", event.name),
            });
        }
        out.push_str(&encode_record(event, layout)?);
        out.push('\n');
    }
    Ok(out)
}
