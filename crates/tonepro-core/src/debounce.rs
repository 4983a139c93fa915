//! Single-slot input debouncer.
//!
//! There is exactly one pending slot for the whole page. Arming it replaces
//! whatever was pending, so the last field edited wins. The debouncer does
//! not own a clock: the host schedules a timer for each [`DebounceTicket`] and
//! hands the ticket back when it fires. Tickets from superseded arms are
//! rejected by [`Debouncer::take_if_current`], so hosts that cannot cancel
//! timers still behave correctly.

use std::time::Duration;

use crate::types::FieldId;

/// Handle for one arming of the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket {
    pub field: FieldId,
    pub generation: u64,
    /// How long the host should wait before handing the ticket back.
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    generation: u64,
    pending: Option<DebounceTicket>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: 0,
            pending: None,
        }
    }

    /// Reset the timer for `field`, superseding any pending ticket.
    pub fn arm(&mut self, field: FieldId) -> DebounceTicket {
        self.generation += 1;
        let ticket = DebounceTicket {
            field,
            generation: self.generation,
            delay: self.quiet,
        };
        self.pending = Some(ticket);
        ticket
    }

    /// Consume the pending slot if `ticket` is still the current one.
    pub fn take_if_current(&mut self, ticket: DebounceTicket) -> bool {
        if self.pending == Some(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> Option<DebounceTicket> {
        self.pending
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Cancel only if the pending ticket belongs to `field`.
    pub fn cancel_field(&mut self, field: FieldId) {
        if self.pending.is_some_and(|t| t.field == field) {
            self.pending = None;
        }
    }
}
