//! Wall-clock helpers shared by the slot computation.
//!
//! Business hours are stored as minute offsets from local midnight, while
//! reservations arrive as epoch seconds. These functions are the only place
//! where the two meet: a calendar day plus an offset becomes an absolute
//! instant in the business timezone, and an absolute instant becomes an
//! `"HH:MM"` label again.
//!
//! # Functions
//!
//! - [`parse_timezone`] - IANA name to [`Tz`]
//! - [`parse_clock_time`] - `"HH:MM"` to minutes after midnight
//! - [`format_clock`] - minutes after midnight to `"HH:MM"`
//! - [`wall_clock`] - epoch seconds to `"HH:MM"` in a timezone

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::error::{Result, SlotError};

pub const MINUTES_PER_DAY: i64 = 24 * 60;
pub const SECONDS_PER_MINUTE: i64 = 60;

/// Parse an IANA timezone string into `Tz`.
///
/// # Errors
///
/// Returns [`SlotError::InvalidTimezone`] if the name is not a known IANA zone.
///
/// # Examples
///
/// ```
/// use slot_engine::temporal::parse_timezone;
///
/// assert!(parse_timezone("Europe/Moscow").is_ok());
/// assert!(parse_timezone("Mars/Olympus").is_err());
/// ```
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| SlotError::InvalidTimezone(format!("'{}'", s)))
}

/// Parse a clock time (`"8:00"`, `"08:30"`, `"24:00"`) into minutes after midnight.
///
/// `"24:00"` is accepted so that a closing time can name the end of the day.
///
/// # Errors
///
/// Returns [`SlotError::InvalidTime`] for anything that is not `H:MM` or `HH:MM`
/// within `00:00..=24:00`.
pub fn parse_clock_time(s: &str) -> Result<i64> {
    let trimmed = s.trim();
    let invalid = || SlotError::InvalidTime(format!("'{}', expected HH:MM", s));

    let (hours, minutes) = trimmed.split_once(':').ok_or_else(invalid)?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;

    if minutes >= 60 || hours > 24 || (hours == 24 && minutes != 0) {
        return Err(invalid());
    }
    Ok(i64::from(hours * 60 + minutes))
}

/// Format minutes after midnight as `"HH:MM"`.
pub fn format_clock(offset_minutes: i64) -> String {
    let hours = offset_minutes.div_euclid(60);
    let minutes = offset_minutes.rem_euclid(60);
    format!("{hours:02}:{minutes:02}")
}

/// Format an epoch instant as local `"HH:MM"` in `tz`.
pub fn wall_clock(epoch_seconds: i64, tz: &Tz) -> String {
    match DateTime::from_timestamp(epoch_seconds, 0) {
        Some(utc) => {
            let local = utc.with_timezone(tz);
            format!("{:02}:{:02}", local.hour(), local.minute())
        }
        None => format!("@{epoch_seconds}"),
    }
}

/// Resolve `day` plus a minute offset from local midnight to an absolute instant.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
///
/// # Errors
///
/// Returns [`SlotError::InvalidDatetime`] if the local time does not exist on
/// that day (DST spring-forward gap).
pub(crate) fn local_instant(day: NaiveDate, offset_minutes: i64, tz: &Tz) -> Result<DateTime<Tz>> {
    let naive = day.and_time(NaiveTime::MIN) + chrono::Duration::minutes(offset_minutes);
    tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
        SlotError::InvalidDatetime(format!(
            "{} {} does not exist in {}",
            day,
            format_clock(offset_minutes),
            tz.name()
        ))
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
