//! Last-write-wins ordering for overlapping slot lookups.
//!
//! Every user interaction (date change, service selection) starts a fresh
//! fetch-then-plan cycle. A slower, older cycle must not overwrite the result
//! of a newer one: each cycle takes a [`RequestTicket`] when it starts, and its
//! result is only applied if that ticket is still the latest.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Position of a request in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request; every earlier ticket becomes stale.
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Pass `value` through only if `ticket` is still the latest request.
    pub fn accept<T>(&self, ticket: RequestTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(ticket = ticket.0, "dropping stale result");
            None
        }
    }
}
