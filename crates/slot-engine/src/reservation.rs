//! Existing reservations as supplied by the booking API.
//!
//! The slot finder relies on the lookup contract: a day's reservations are
//! sorted by start and never overlap. [`validate_sequence`] checks that
//! contract so a broken upstream fails loudly instead of yielding wrong gaps.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::listing::decode_listing;

/// A booked interval `[start, end)` in epoch seconds on calendar day `day`.
///
/// Serialized with the booking API's field names (`timestamp`,
/// `ending_time`, `date`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "timestamp")]
    pub start: i64,
    #[serde(rename = "ending_time")]
    pub end: i64,
    #[serde(rename = "date")]
    pub day: NaiveDate,
}

impl Reservation {
    pub fn new(start: i64, end: i64, day: NaiveDate) -> Self {
        Self {
            id: None,
            start,
            end,
            day,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether `[start, end)` intersects this reservation.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        start < self.end && self.start < end
    }

    fn describe(&self) -> String {
        match &self.id {
            Some(id) => format!("'{id}' [{}, {})", self.start, self.end),
            None => format!("[{}, {})", self.start, self.end),
        }
    }
}

/// Check the lookup contract for one day's reservations.
///
/// # Errors
///
/// Returns [`SlotError::MalformedReservationSequence`] if any reservation is
/// empty or inverted, belongs to another day, starts before its predecessor,
/// or overlaps its predecessor.
pub fn validate_sequence(day: NaiveDate, reservations: &[Reservation]) -> Result<()> {
    for (i, current) in reservations.iter().enumerate() {
        if current.start >= current.end {
            return Err(SlotError::MalformedReservationSequence(format!(
                "reservation {} does not end after it starts",
                current.describe()
            )));
        }
        if current.day != day {
            return Err(SlotError::MalformedReservationSequence(format!(
                "reservation {} is dated {}, expected {}",
                current.describe(),
                current.day,
                day
            )));
        }
        let Some(prev) = i.checked_sub(1).map(|p| &reservations[p]) else {
            continue;
        };
        if current.start < prev.start {
            return Err(SlotError::MalformedReservationSequence(format!(
                "reservation {} is not sorted after {}",
                current.describe(),
                prev.describe()
            )));
        }
        if current.start < prev.end {
            return Err(SlotError::MalformedReservationSequence(format!(
                "reservation {} overlaps {}",
                current.describe(),
                prev.describe()
            )));
        }
    }
    Ok(())
}

/// Drop the reservation being edited, matched by its start time.
pub fn exclude_edited(reservations: &[Reservation], edited: &Reservation) -> Vec<Reservation> {
    reservations
        .iter()
        .filter(|r| r.start != edited.start)
        .cloned()
        .collect()
}

/// Reservation lookup: the ordered reservations of one calendar day.
pub trait ReservationSource {
    fn reservations_on(&self, day: NaiveDate) -> Vec<Reservation>;
}

/// In-memory reservation store, in the order the booking API returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationBook {
    entries: Vec<Reservation>,
}

impl ReservationBook {
    pub fn new(entries: Vec<Reservation>) -> Self {
        Self { entries }
    }

    /// Decode a bare JSON array or a `{ "results": [...] }` envelope.
    pub fn from_json(json: &str) -> Result<Self> {
        decode_listing(json, "reservations").map(Self::new)
    }

    /// The reservation starting at `start`, on any day.
    pub fn find_by_start(&self, start: i64) -> Option<&Reservation> {
        self.entries.iter().find(|r| r.start == start)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReservationSource for ReservationBook {
    fn reservations_on(&self, day: NaiveDate) -> Vec<Reservation> {
        self.entries.iter().filter(|r| r.day == day).cloned().collect()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
