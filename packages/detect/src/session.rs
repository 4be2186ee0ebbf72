#![allow(clippy::module_name_repetitions)]
//! Detection request supersession.
//!
//! Only the most recent detection request matters to the UI: when a user
//! adjusts the region or options and re-runs detection, the in-flight
//! request is superseded. The session hands out a ticket per request;
//! when a response arrives, the caller checks the ticket and discards
//! results from superseded requests. Dropping the session on teardown
//! abandons everything without touching registry state.

use std::sync::atomic::{AtomicU64, Ordering};

/// A token identifying one detection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionTicket {
    generation: u64,
}

/// Tracks which detection request is the current one.
#[derive(Debug, Default)]
pub struct DetectionSession {
    current: AtomicU64,
}

impl DetectionSession {
    /// Creates a session with no requests issued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: AtomicU64::new(0),
        }
    }

    /// Starts a new request, superseding any in-flight one.
    pub fn begin(&self) -> DetectionTicket {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        DetectionTicket { generation }
    }

    /// `true` while the ticket's request has not been superseded.
    #[must_use]
    pub fn is_current(&self, ticket: DetectionTicket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.generation
    }
}
