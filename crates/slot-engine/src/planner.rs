//! Caller-side policy around the slot finder.
//!
//! Decides between three outcomes for a booking form: a list of time choices,
//! "no slots, choose a different day", or free-form time entry. Free-form
//! entry is used when the day has no reservations at all, including when the
//! only reservation is the one being edited.

use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SlotError};
use crate::reservation::{exclude_edited, Reservation};
use crate::schedule::Schedule;
use crate::slots::{find_slots_into, Candidate, SlotRequest, SlotSink};
use crate::temporal::wall_clock;

/// One selectable time: `value` is the `"HH:MM"` start submitted with the
/// form, `label` the `"HH:MM-HH:MM"` text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeChoice {
    pub value: String,
    pub label: String,
    pub candidate: Candidate,
}

/// What the booking form should offer for a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotPlan {
    /// Pick one of these times.
    Choices { choices: Vec<TimeChoice> },
    /// The day is fully booked for this duration.
    NoneAvailable,
    /// Nothing constrains the day; let the user type a time.
    ManualEntry { prefill: Option<String> },
}

impl SlotPlan {
    /// Whether submission stays disabled until the user picks a choice.
    pub fn requires_selection(&self) -> bool {
        !matches!(self, SlotPlan::ManualEntry { .. })
    }

    pub fn choices(&self) -> &[TimeChoice] {
        match self {
            SlotPlan::Choices { choices } => choices,
            _ => &[],
        }
    }
}

/// Sink that turns candidates into labelled [`TimeChoice`]s.
#[derive(Debug, Clone)]
pub struct ChoiceSink {
    timezone: Tz,
    choices: Vec<TimeChoice>,
}

impl ChoiceSink {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            choices: Vec::new(),
        }
    }

    pub fn into_choices(self) -> Vec<TimeChoice> {
        self.choices
    }
}

impl SlotSink for ChoiceSink {
    fn accept(&mut self, candidate: Candidate) {
        self.choices.push(TimeChoice {
            value: candidate.start_label(&self.timezone),
            label: candidate.label(&self.timezone),
            candidate,
        });
    }
}

/// Plan the time selection for `request`.
///
/// `reservations` are the day's reservations as returned by the lookup.
/// `editing` is the reservation being rescheduled, if any: on its own day it
/// is excluded (matched by start time) before slots are computed, and its
/// start time pre-fills manual entry.
///
/// # Errors
///
/// Fails with [`SlotError::InvalidDuration`] for a non-positive
/// duration, before any fallback is considered, and propagates every other
/// slot finder error.
pub fn plan_slots(
    schedule: &Schedule,
    request: &SlotRequest,
    reservations: &[Reservation],
    editing: Option<&Reservation>,
) -> Result<SlotPlan> {
    if request.duration_minutes <= 0 {
        return Err(SlotError::InvalidDuration(format!(
            "{} minutes, must be positive",
            request.duration_minutes
        )));
    }

    let tz = schedule.timezone();
    let prefill = editing.map(|e| wall_clock(e.start, &tz));

    let remaining;
    let busy = match editing {
        Some(edited) if edited.day == request.day => {
            remaining = exclude_edited(reservations, edited);
            remaining.as_slice()
        }
        _ => reservations,
    };

    if busy.is_empty() {
        debug!(day = %request.day, "no reservations constrain the day, manual entry");
        return Ok(SlotPlan::ManualEntry { prefill });
    }

    let mut sink = ChoiceSink::new(tz);
    find_slots_into(schedule, request, busy, &mut sink)?;
    let choices = sink.into_choices();

    if choices.is_empty() {
        debug!(day = %request.day, duration_minutes = request.duration_minutes, "fully booked");
        Ok(SlotPlan::NoneAvailable)
    } else {
        Ok(SlotPlan::Choices { choices })
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

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

    fn plan(duration: i64, list: &[Reservation], editing: Option<&Reservation>) -> SlotPlan {
        plan_slots(
            &Schedule::default(),
            &SlotRequest::new(day(), duration),
            list,
            editing,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_day_falls_back_to_manual_entry() {
        let result = plan(60, &[], None);
        assert_eq!(result, SlotPlan::ManualEntry { prefill: None });
        assert!(!result.requires_selection());
    }

    #[test]
    fn test_choices_are_labelled() {
        let result = plan(60, &[res(10, 0, 11, 0)], None);
        let choices = result.choices();
        assert_eq!(choices[0].value, "08:00");
        assert_eq!(choices[0].label, "08:00-09:00");
        assert_eq!(choices[2].label, "09:00-10:00");
        assert_eq!(choices[3].label, "11:00-12:00");
        assert!(result.requires_selection());
    }

    #[test]
    fn test_fully_booked_is_not_an_error() {
        let result = plan(30, &[res(8, 0, 20, 0)], None);
        assert_eq!(result, SlotPlan::NoneAvailable);
        assert!(result.requires_selection());
        assert!(result.choices().is_empty());
    }

    #[test]
    fn test_editing_excludes_own_reservation() {
        let list = [res(8, 0, 12, 0), res(12, 0, 14, 0), res(14, 0, 20, 0)];
        let edited = res(12, 0, 14, 0);
        let result = plan(120, &list, Some(&edited));
        let labels: Vec<_> = result.choices().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["12:00-14:00"]);
    }

    #[test]
    fn test_editing_only_reservation_falls_back_to_manual_entry() {
        let edited = res(15, 30, 16, 30);
        let result = plan(60, &[edited.clone()], Some(&edited));
        assert_eq!(
            result,
            SlotPlan::ManualEntry {
                prefill: Some("15:30".to_string())
            }
        );
    }

    #[test]
    fn test_editing_on_other_day_keeps_reservations() {
        let other = NaiveDate::from_ymd_opt(2026, 3, 17).unwrap();
        let edited = Reservation::new(at(24 + 10, 0), at(24 + 11, 0), other);
        // Rescheduling onto another day: that day is planned as-is
        let list = [res(8, 0, 20, 0)];
        assert_eq!(plan(30, &list, Some(&edited)), SlotPlan::NoneAvailable);
    }

    #[test]
    fn test_invalid_duration_fails_before_fallback() {
        let result = plan_slots(&Schedule::default(), &SlotRequest::new(day(), 0), &[], None);
        assert!(matches!(result, Err(SlotError::InvalidDuration(_))));
    }

    #[test]
    fn test_plan_serializes_with_kind_tag() {
        let json = serde_json::to_value(plan(30, &[res(8, 0, 20, 0)], None)).unwrap();
        assert_eq!(json["kind"], "none_available");

        let json = serde_json::to_value(plan(600, &[res(8, 0, 9, 0)], None)).unwrap();
        assert_eq!(json["kind"], "choices");
        assert_eq!(json["choices"][0]["label"], "09:00-19:00");
        assert_eq!(json["choices"][0]["candidate"]["start_offset_minutes"], 540);
    }
}
