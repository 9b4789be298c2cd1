//! Free-slot computation over a day's reservations.
//!
//! The day's business window is cut into gaps by the existing reservations:
//! before the first one, between each consecutive pair, and after the last.
//! Every gap long enough for the requested duration yields candidates starting
//! at the gap start and stepping by the schedule granularity, as long as the
//! candidate still ends inside the gap.
//!
//! Enumeration writes into a [`SlotSink`], so the same computation can collect
//! candidates, log them, or build UI choices without being duplicated per use.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, SlotError};
use crate::reservation::{validate_sequence, Reservation};
use crate::schedule::{DayWindow, Schedule};
use crate::temporal::{wall_clock, SECONDS_PER_MINUTE};

/// Contiguous free time `[start, end)` in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gap {
    pub start: i64,
    pub end: i64,
}

impl Gap {
    pub fn len_seconds(&self) -> i64 {
        (self.end - self.start).max(0)
    }

    /// Number of candidates of `duration` seconds stepped by `step` seconds.
    pub fn capacity(&self, duration: i64, step: i64) -> i64 {
        let len = self.len_seconds();
        if len < duration {
            0
        } else {
            (len - duration) / step + 1
        }
    }
}

/// A start time at which a new appointment fits.
///
/// Offsets are wall-clock minutes after local midnight of the requested day,
/// comparable with [`BusinessHours`](crate::BusinessHours); the epoch fields
/// are the same interval as absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Candidate {
    pub start_offset_minutes: i64,
    pub end_offset_minutes: i64,
    pub start_epoch_seconds: i64,
    pub end_epoch_seconds: i64,
}

impl Candidate {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_epoch_seconds - self.start_epoch_seconds) / SECONDS_PER_MINUTE
    }

    /// `"HH:MM"` start as seen on a wall clock in `tz`.
    pub fn start_label(&self, tz: &Tz) -> String {
        wall_clock(self.start_epoch_seconds, tz)
    }

    /// `"HH:MM-HH:MM"` as seen on a wall clock in `tz`.
    pub fn label(&self, tz: &Tz) -> String {
        format!(
            "{}-{}",
            wall_clock(self.start_epoch_seconds, tz),
            wall_clock(self.end_epoch_seconds, tz)
        )
    }

    pub fn overlaps(&self, reservation: &Reservation) -> bool {
        reservation.overlaps(self.start_epoch_seconds, self.end_epoch_seconds)
    }
}

/// Day and total service duration of a booking attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRequest {
    pub day: NaiveDate,
    pub duration_minutes: i64,
}

impl SlotRequest {
    pub fn new(day: NaiveDate, duration_minutes: i64) -> Self {
        Self {
            day,
            duration_minutes,
        }
    }
}

/// Receiver of enumerated candidates, in chronological order.
pub trait SlotSink {
    fn accept(&mut self, candidate: Candidate);
}

impl SlotSink for Vec<Candidate> {
    fn accept(&mut self, candidate: Candidate) {
        self.push(candidate);
    }
}

/// Sink that only reports candidates through `tracing`.
#[derive(Debug, Clone)]
pub struct LogSink {
    timezone: Tz,
    emitted: usize,
}

impl LogSink {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            emitted: 0,
        }
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }
}

impl SlotSink for LogSink {
    fn accept(&mut self, candidate: Candidate) {
        self.emitted += 1;
        info!(slot = %candidate.label(&self.timezone), "free slot");
    }
}

/// Free gaps of the business window around `reservations`.
///
/// Gaps are clamped to the window and trimmed inward to whole wall-clock
/// minutes; empty gaps are omitted. `reservations` must already satisfy
/// [`validate_sequence`].
pub fn gaps(window: &DayWindow, reservations: &[Reservation]) -> Vec<Gap> {
    let mut bounds = Vec::with_capacity(reservations.len() + 1);
    let mut cursor = window.open;
    for reservation in reservations {
        bounds.push((cursor, reservation.start));
        cursor = reservation.end;
    }
    bounds.push((cursor, window.close));

    bounds
        .into_iter()
        .filter_map(|(start, end)| {
            let start = ceil_minute(window, start.max(window.open));
            let end = floor_minute(window, end.min(window.close));
            (start < end).then_some(Gap { start, end })
        })
        .collect()
}

/// Compute every candidate for `request` and collect them in order.
///
/// # Errors
///
/// Returns [`SlotError::InvalidDuration`] for a non-positive duration,
/// [`SlotError::MalformedReservationSequence`] if `reservations` break the
/// sorted, non-overlapping, same-day contract, and
/// [`SlotError::InvalidDatetime`] if business hours do not exist on that day.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use slot_engine::{find_slots, Schedule, SlotRequest};
///
/// let day = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
/// let slots = find_slots(&Schedule::default(), &SlotRequest::new(day, 60), &[]).unwrap();
/// // 08:00, 08:30, ..., 19:00
/// assert_eq!(slots.len(), 23);
/// assert_eq!(slots.last().unwrap().end_offset_minutes, 20 * 60);
/// ```
pub fn find_slots(
    schedule: &Schedule,
    request: &SlotRequest,
    reservations: &[Reservation],
) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    find_slots_into(schedule, request, reservations, &mut candidates)?;
    Ok(candidates)
}

/// Compute every candidate for `request` and feed them to `sink`.
///
/// Returns the number of candidates emitted. Zero is a normal, fully booked
/// outcome. Errors are the same as [`find_slots`]; on error nothing has been
/// emitted.
pub fn find_slots_into<S: SlotSink + ?Sized>(
    schedule: &Schedule,
    request: &SlotRequest,
    reservations: &[Reservation],
    sink: &mut S,
) -> Result<usize> {
    if request.duration_minutes <= 0 {
        return Err(SlotError::InvalidDuration(format!(
            "{} minutes, must be positive",
            request.duration_minutes
        )));
    }
    let window = schedule.day_window(request.day)?;
    validate_sequence(request.day, reservations)?;

    if request.duration_minutes > schedule.hours().window_minutes() {
        debug!(
            day = %request.day,
            duration_minutes = request.duration_minutes,
            window_minutes = schedule.hours().window_minutes(),
            "duration exceeds business hours"
        );
        return Ok(0);
    }
    let duration = request.duration_minutes * SECONDS_PER_MINUTE;
    let step = schedule.granularity_minutes().saturating_mul(SECONDS_PER_MINUTE);

    let mut emitted = 0usize;
    for gap in gaps(&window, reservations) {
        let fits = gap.capacity(duration, step);
        debug!(
            gap_start = gap.start,
            gap_end = gap.end,
            candidates = fits,
            "evaluated gap"
        );
        for k in 0..fits {
            let start = gap.start + k * step;
            let end = start + duration;
            sink.accept(Candidate {
                start_offset_minutes: window.offset_minutes(start),
                end_offset_minutes: window.offset_minutes(end),
                start_epoch_seconds: start,
                end_epoch_seconds: end,
            });
            emitted += 1;
        }
    }

    debug!(
        day = %request.day,
        duration_minutes = request.duration_minutes,
        reservations = reservations.len(),
        candidates = emitted,
        "slot search finished"
    );
    Ok(emitted)
}

fn ceil_minute(window: &DayWindow, t: i64) -> i64 {
    let rem = window.local_seconds(t).rem_euclid(SECONDS_PER_MINUTE);
    if rem == 0 {
        t
    } else {
        t + SECONDS_PER_MINUTE - rem
    }
}

fn floor_minute(window: &DayWindow, t: i64) -> i64 {
    t - window.local_seconds(t).rem_euclid(SECONDS_PER_MINUTE)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::BusinessHours;
    use crate::temporal::{format_clock, parse_timezone};

    const MIDNIGHT: i64 = 1_773_619_200; // 2026-03-16T00:00:00Z

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
    }

    fn at(h: i64, m: i64) -> i64 {
        MIDNIGHT + h * 3600 + m * 60
    }

    fn res(h1: i64, m1: i64, h2: i64, m2: i64) -> Reservation {
        Reservation::new(at(h1, m1), at(h2, m2), day())
    }

    fn starts(candidates: &[Candidate]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| format_clock(c.start_offset_minutes))
            .collect()
    }

    fn slots(duration: i64, reservations: &[Reservation]) -> Vec<Candidate> {
        find_slots(
            &Schedule::default(),
            &SlotRequest::new(day(), duration),
            reservations,
        )
        .unwrap()
    }

    // ── find_slots scenarios ────────────────────────────────────────────

    #[test]
    fn test_empty_day_hourly_service() {
        let result = slots(60, &[]);
        assert_eq!(result.len(), 23);
        assert_eq!(format_clock(result[0].start_offset_minutes), "08:00");
        assert_eq!(format_clock(result[1].start_offset_minutes), "08:30");
        let last = result.last().unwrap();
        assert_eq!(format_clock(last.start_offset_minutes), "19:00");
        assert_eq!(format_clock(last.end_offset_minutes), "20:00");
    }

    #[test]
    fn test_single_reservation_splits_day() {
        let booked = res(10, 0, 11, 0);
        let result = slots(30, &[booked.clone()]);
        let labels = starts(&result);

        assert_eq!(&labels[..4], &["08:00", "08:30", "09:00", "09:30"]);
        assert_eq!(labels[4], "11:00");
        assert_eq!(labels.last().unwrap(), "19:30");
        // 4 before, 18 after
        assert_eq!(result.len(), 22);
        assert!(result.iter().all(|c| !c.overlaps(&booked)));
    }

    #[test]
    fn test_full_day_reservation_yields_nothing() {
        for duration in [1, 30, 60, 720] {
            assert!(slots(duration, &[res(8, 0, 20, 0)]).is_empty());
        }
    }

    #[test]
    fn test_short_interior_gap_is_skipped() {
        let list = [res(9, 0, 9, 30), res(9, 45, 10, 0)];
        let result = slots(45, &list);
        assert!(result
            .iter()
            .all(|c| c.start_epoch_seconds < at(9, 0) || c.start_epoch_seconds >= at(10, 0)));
        // Leading gap 08:00-09:00 fits only 08:00
        assert_eq!(starts(&result)[0], "08:00");
        assert_eq!(starts(&result)[1], "10:00");
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let err = find_slots(&Schedule::default(), &SlotRequest::new(day(), 0), &[])
            .unwrap_err();
        assert!(matches!(err, SlotError::InvalidDuration(_)));
    }

    #[test]
    fn test_negative_duration_is_rejected() {
        let err = find_slots(&Schedule::default(), &SlotRequest::new(day(), -30), &[])
            .unwrap_err()
            .to_string();
        assert!(err.contains("Invalid duration"), "got: {err}");
    }

    #[test]
    fn test_interior_gap_between_first_two_reservations() {
        // The first inter-reservation gap must be offered like every other one
        let list = [res(8, 0, 9, 0), res(10, 0, 11, 0), res(11, 0, 20, 0)];
        assert_eq!(starts(&slots(30, &list)), vec!["09:00", "09:30"]);
    }

    #[test]
    fn test_gap_start_is_not_realigned_to_grid() {
        // Reservation ends at 10:15: candidates step from 10:15
        let result = slots(60, &[res(8, 0, 10, 15)]);
        assert_eq!(&starts(&result)[..3], &["10:15", "10:45", "11:15"]);
        assert_eq!(starts(&result).last().unwrap(), "18:45");
    }

    #[test]
    fn test_duration_not_multiple_of_granularity() {
        let result = slots(45, &[]);
        assert_eq!(result[0].duration_minutes(), 45);
        assert_eq!(format_clock(result[0].end_offset_minutes), "08:45");
        // floor((720 - 45) / 30) + 1
        assert_eq!(result.len(), 23);
    }

    #[test]
    fn test_duration_longer_than_window() {
        assert!(slots(721, &[]).is_empty());
        assert_eq!(slots(720, &[]).len(), 1);
    }

    #[test]
    fn test_huge_duration_yields_nothing() {
        assert!(slots(i64::MAX / 2, &[]).is_empty());
        assert!(slots(i64::MAX, &[res(9, 0, 10, 0)]).is_empty());
    }

    #[test]
    fn test_huge_granularity_offers_each_gap_start() {
        let schedule = Schedule::new(BusinessHours::default(), i64::MAX, Tz::UTC).unwrap();
        let list = [res(10, 0, 11, 0)];
        let result = find_slots(&schedule, &SlotRequest::new(day(), 30), &list).unwrap();
        assert_eq!(starts(&result), vec!["08:00", "11:00"]);
    }

    #[test]
    fn test_trailing_gap_shorter_than_duration_is_not_offered() {
        // 19:30-20:00 is free but too short for an hour; no overflowing slot
        let result = slots(60, &[res(8, 0, 19, 30)]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_reservations_outside_hours_are_clamped() {
        let list = [res(6, 0, 6, 30), res(7, 0, 8, 30), res(19, 30, 21, 0)];
        let result = slots(30, &list);
        assert_eq!(starts(&result)[0], "08:30");
        assert_eq!(starts(&result).last().unwrap(), "19:00");
        assert!(result.iter().all(|c| c.start_offset_minutes >= 480));
    }

    #[test]
    fn test_sub_minute_reservation_edges_are_trimmed() {
        let list = [Reservation::new(at(8, 0), at(9, 0) + 20, day())];
        let result = slots(30, &list);
        assert_eq!(starts(&result)[0], "09:01");
        assert!(result.iter().all(|c| !c.overlaps(&list[0])));
    }

    #[test]
    fn test_malformed_sequence_fails_loudly() {
        let list = [res(10, 0, 11, 0), res(10, 30, 12, 0)];
        let err = find_slots(&Schedule::default(), &SlotRequest::new(day(), 30), &list)
            .unwrap_err();
        assert!(matches!(err, SlotError::MalformedReservationSequence(_)));
    }

    #[test]
    fn test_custom_granularity_and_hours() {
        let schedule =
            Schedule::new(BusinessHours::parse("9:00", "10:00").unwrap(), 15, Tz::UTC).unwrap();
        let result = find_slots(&schedule, &SlotRequest::new(day(), 30), &[]).unwrap();
        assert_eq!(starts(&result), vec!["09:00", "09:15", "09:30"]);
    }

    #[test]
    fn test_timezone_shifts_epoch_not_offsets() {
        let tz = parse_timezone("Europe/Moscow").unwrap();
        let schedule = Schedule::new(BusinessHours::default(), 30, tz).unwrap();
        let result = find_slots(&schedule, &SlotRequest::new(day(), 60), &[]).unwrap();
        assert_eq!(result[0].start_offset_minutes, 480);
        // 08:00 Moscow is 05:00 UTC
        assert_eq!(result[0].start_epoch_seconds, at(5, 0));
        assert_eq!(result[0].label(&tz), "08:00-09:00");
    }

    #[test]
    fn test_spring_forward_offsets_match_business_hours() {
        // 2026-03-08: New York skips 02:00-03:00; 08:00 EDT is 12:00Z
        let tz = parse_timezone("America/New_York").unwrap();
        let dst_day = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let schedule = Schedule::new(BusinessHours::default(), 30, tz).unwrap();
        let result = find_slots(&schedule, &SlotRequest::new(dst_day, 60), &[]).unwrap();

        let first = result[0];
        let last = result.last().unwrap();
        assert_eq!(first.start_offset_minutes, 480);
        assert_eq!(first.start_epoch_seconds, 1_772_971_200);
        assert_eq!(first.label(&tz), "08:00-09:00");
        assert_eq!(last.end_offset_minutes, 1200);
        assert_eq!(result.len(), 23);
    }

    #[test]
    fn test_hours_spanning_spring_forward_count_real_time() {
        // 01:00-04:00 wall clock on the transition day is two real hours
        let tz = parse_timezone("America/New_York").unwrap();
        let dst_day = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let hours = BusinessHours::parse("1:00", "4:00").unwrap();
        let schedule = Schedule::new(hours, 30, tz).unwrap();
        let result = find_slots(&schedule, &SlotRequest::new(dst_day, 60), &[]).unwrap();

        let labels: Vec<_> = result.iter().map(|c| c.label(&tz)).collect();
        assert_eq!(labels, vec!["01:00-03:00", "01:30-03:30", "03:00-04:00"]);
        assert!(result.iter().all(|c| c.duration_minutes() == 60));
        assert_eq!(result[2].start_offset_minutes, 180);
    }

    // ── gaps ────────────────────────────────────────────────────────────

    #[test]
    fn test_gaps_of_empty_day_is_whole_window() {
        let window = Schedule::default().day_window(day()).unwrap();
        assert_eq!(
            gaps(&window, &[]),
            vec![Gap {
                start: at(8, 0),
                end: at(20, 0)
            }]
        );
    }

    #[test]
    fn test_gaps_omit_back_to_back_reservations() {
        let window = Schedule::default().day_window(day()).unwrap();
        let list = [res(8, 0, 9, 0), res(9, 0, 10, 0)];
        assert_eq!(
            gaps(&window, &list),
            vec![Gap {
                start: at(10, 0),
                end: at(20, 0)
            }]
        );
    }

    #[test]
    fn test_gap_capacity() {
        let gap = Gap {
            start: 0,
            end: 3600,
        };
        assert_eq!(gap.capacity(1800, 1800), 2);
        assert_eq!(gap.capacity(3600, 1800), 1);
        assert_eq!(gap.capacity(3660, 1800), 0);
    }

    // ── sinks ───────────────────────────────────────────────────────────

    #[test]
    fn test_log_sink_counts_what_vec_collects() {
        let list = [res(12, 0, 13, 0)];
        let mut log = LogSink::new(Tz::UTC);
        let n = find_slots_into(
            &Schedule::default(),
            &SlotRequest::new(day(), 60),
            &list,
            &mut log,
        )
        .unwrap();
        assert_eq!(n, log.emitted());
        assert_eq!(n, slots(60, &list).len());
    }

    #[test]
    fn test_candidate_labels() {
        let first = slots(90, &[])[0];
        assert_eq!(first.label(&Tz::UTC), "08:00-09:30");
        assert_eq!(first.start_label(&Tz::UTC), "08:00");
    }
}
