//! # slot-engine
//!
//! Deterministic appointment slot computation.
//!
//! Given the reservations already booked on a day and the total duration of
//! the services a client selected, the Slot Engine lists every start time at
//! which the new appointment fits: inside business hours, clear of existing
//! reservations, stepped by a fixed granularity.
//!
//! ## Modules
//!
//! - [`slots`] - Gap enumeration and candidate generation (the core)
//! - [`planner`] - Edit-mode exclusion, manual-entry fallback, labelled choices
//! - [`schedule`] - Business hours, granularity and timezone
//! - [`reservation`] - Reservation records, sequence validation, lookup contract
//! - [`services`] - Service catalog and duration lookup
//! - [`sequencer`] - Last-write-wins ordering of concurrent lookups
//! - [`config`] - JSON scheduler configuration
//! - [`temporal`] - Clock-time parsing and formatting, timezone resolution
//! - [`error`] - Error types

pub mod config;
pub mod error;
mod listing;
pub mod planner;
pub mod reservation;
pub mod schedule;
pub mod sequencer;
pub mod services;
pub mod slots;
pub mod temporal;

pub use config::SchedulerConfig;
pub use error::SlotError;
pub use planner::{plan_slots, ChoiceSink, SlotPlan, TimeChoice};
pub use reservation::{
    exclude_edited, validate_sequence, Reservation, ReservationBook, ReservationSource,
};
pub use schedule::{BusinessHours, DayWindow, Schedule};
pub use sequencer::{RequestSequencer, RequestTicket};
pub use services::{hours_to_minutes, DurationSource, Service, ServiceCatalog};
pub use slots::{
    find_slots, find_slots_into, gaps, Candidate, Gap, LogSink, SlotRequest, SlotSink,
};
