//! Business hours, granularity and timezone bundled into a validated [`Schedule`].

use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::temporal::{format_clock, local_instant, parse_clock_time, MINUTES_PER_DAY};

pub const DEFAULT_OPEN_MINUTES: i64 = 8 * 60;
pub const DEFAULT_CLOSE_MINUTES: i64 = 20 * 60;
pub const DEFAULT_GRANULARITY_MINUTES: i64 = 30;

/// The daily window during which appointments may be scheduled, as minute
/// offsets from local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub open_offset_minutes: i64,
    pub close_offset_minutes: i64,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open_offset_minutes: DEFAULT_OPEN_MINUTES,
            close_offset_minutes: DEFAULT_CLOSE_MINUTES,
        }
    }
}

impl BusinessHours {
    /// Build business hours from minute offsets.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::InvalidBusinessHours`] unless
    /// `0 <= open < close <= 1440`.
    pub fn new(open_offset_minutes: i64, close_offset_minutes: i64) -> Result<Self> {
        let hours = Self {
            open_offset_minutes,
            close_offset_minutes,
        };
        hours.validate()?;
        Ok(hours)
    }

    /// Build business hours from `"HH:MM"` strings, e.g. `("8:00", "20:00")`.
    pub fn parse(open: &str, close: &str) -> Result<Self> {
        Self::new(parse_clock_time(open)?, parse_clock_time(close)?)
    }

    pub fn validate(&self) -> Result<()> {
        let (open, close) = (self.open_offset_minutes, self.close_offset_minutes);
        if !(0..=MINUTES_PER_DAY).contains(&open) || !(0..=MINUTES_PER_DAY).contains(&close) {
            return Err(SlotError::InvalidBusinessHours(format!(
                "{open}..{close} minutes is outside 00:00-24:00"
            )));
        }
        if open >= close {
            return Err(SlotError::InvalidBusinessHours(format!(
                "opening {} is not before closing {}",
                format_clock(open),
                format_clock(close)
            )));
        }
        Ok(())
    }

    /// Length of the business window in minutes.
    pub fn window_minutes(&self) -> i64 {
        self.close_offset_minutes - self.open_offset_minutes
    }
}

/// Validated scheduling parameters for one business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    hours: BusinessHours,
    granularity_minutes: i64,
    timezone: Tz,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            hours: BusinessHours::default(),
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            timezone: Tz::UTC,
        }
    }
}

impl Schedule {
    /// # Errors
    ///
    /// Returns [`SlotError::InvalidBusinessHours`] for an empty or out-of-day
    /// window and [`SlotError::InvalidGranularity`] for a non-positive step.
    pub fn new(hours: BusinessHours, granularity_minutes: i64, timezone: Tz) -> Result<Self> {
        hours.validate()?;
        if granularity_minutes <= 0 {
            return Err(SlotError::InvalidGranularity(format!(
                "{granularity_minutes} minutes, must be positive"
            )));
        }
        Ok(Self {
            hours,
            granularity_minutes,
            timezone,
        })
    }

    pub fn hours(&self) -> BusinessHours {
        self.hours
    }

    pub fn granularity_minutes(&self) -> i64 {
        self.granularity_minutes
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Resolve business open/close for `day` to absolute instants.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::InvalidDatetime`] when opening or closing falls
    /// into a DST gap on that day.
    pub fn day_window(&self, day: NaiveDate) -> Result<DayWindow> {
        let tz = &self.timezone;
        let open = local_instant(day, self.hours.open_offset_minutes, tz)?.timestamp();
        let close = local_instant(day, self.hours.close_offset_minutes, tz)?.timestamp();
        Ok(DayWindow {
            day,
            timezone: self.timezone,
            open_offset_minutes: self.hours.open_offset_minutes,
            open,
            close,
        })
    }
}

/// Business hours of one calendar day as epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub day: NaiveDate,
    pub timezone: Tz,
    pub open_offset_minutes: i64,
    pub open: i64,
    pub close: i64,
}

impl DayWindow {
    /// Wall-clock seconds after local midnight of `day` at `epoch_seconds`.
    ///
    /// Read off the local clock, so business-hour offsets and instants agree
    /// on DST transition days.
    pub fn local_seconds(&self, epoch_seconds: i64) -> i64 {
        match DateTime::from_timestamp(epoch_seconds, 0) {
            Some(utc) => utc
                .with_timezone(&self.timezone)
                .naive_local()
                .signed_duration_since(self.day.and_time(NaiveTime::MIN))
                .num_seconds(),
            // Outside chrono's range: count from opening
            None => self.open_offset_minutes * 60 + (epoch_seconds - self.open),
        }
    }

    /// Whole wall-clock minutes after local midnight at `epoch_seconds`.
    pub fn offset_minutes(&self, epoch_seconds: i64) -> i64 {
        self.local_seconds(epoch_seconds).div_euclid(60)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
