//! Self-rescheduling poll timer.
//!
//! The loop never owns a running task. It holds at most one pending timer
//! (a deadline plus the chain it belongs to) and the caller's event loop
//! asks it whether that timer is due. Scheduling always replaces the
//! pending timer, so two timers can never coexist.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::data::ProviderId;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// No timer pending and nothing in flight.
    Idle,
    /// A tick is scheduled.
    Scheduled,
    /// A fetch is in flight and no timer is pending.
    Fetching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingTimer {
    due: Instant,
    chain: u64,
}

/// Identifies one issued fetch and the shape it was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickTicket {
    pub id: u64,
    /// The start that opened this tick's chain.
    pub chain: u64,
    pub layout: Vec<String>,
    pub providers: Vec<ProviderId>,
}

/// Poll timer state machine.
#[derive(Debug)]
pub struct PollLoop {
    interval: Duration,
    chain: u64,
    next_tick: u64,
    pending: Option<PendingTimer>,
    in_flight: usize,
    last_failure: Option<String>,
}

impl PollLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            chain: 0,
            next_tick: 0,
            pending: None,
            in_flight: 0,
            last_failure: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Open a new chain with a tick due immediately.
    ///
    /// Any timer left over from an earlier chain is cancelled.
    pub fn start(&mut self, now: Instant) -> u64 {
        self.chain += 1;
        self.last_failure = None;
        self.schedule(now, self.chain);
        debug!(chain = self.chain, "poll chain started");
        self.chain
    }

    fn schedule(&mut self, due: Instant, chain: u64) {
        if let Some(previous) = self.pending.replace(PendingTimer { due, chain }) {
            debug!(chain = previous.chain, "replaced pending poll timer");
        }
    }

    /// Drop the pending timer, if any.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.pending.is_some_and(|t| t.due <= now)
    }

    /// Fire the pending timer if it is due, returning its chain.
    pub fn fire(&mut self, now: Instant) -> Option<u64> {
        if !self.is_due(now) {
            return None;
        }
        self.pending.take().map(|t| t.chain)
    }

    /// Record an issued fetch.
    pub fn begin(&mut self, chain: u64, layout: Vec<String>, providers: Vec<ProviderId>) -> TickTicket {
        self.next_tick += 1;
        self.in_flight += 1;
        TickTicket {
            id: self.next_tick,
            chain,
            layout,
            providers,
        }
    }

    /// Reschedule after a tick of `chain` ended without issuing or after a
    /// successful fetch. Only the current chain reschedules, and only while
    /// monitoring.
    fn reschedule(&mut self, chain: u64, monitoring: bool, now: Instant) -> bool {
        if monitoring && chain == self.chain {
            self.schedule(now + self.interval, chain);
            true
        } else {
            false
        }
    }

    /// A fetch completed and its batch was committed.
    pub fn finish(&mut self, ticket: &TickTicket, monitoring: bool, now: Instant) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.reschedule(ticket.chain, monitoring, now)
    }

    /// A fetch failed. The chain ends here.
    pub fn fail(&mut self, ticket: &TickTicket, reason: String) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if ticket.chain == self.chain {
            self.last_failure = Some(reason);
        }
    }

    /// A fired timer had nothing to fetch.
    pub fn skip(&mut self, chain: u64, monitoring: bool, now: Instant) -> bool {
        self.reschedule(chain, monitoring, now)
    }

    pub fn phase(&self) -> PollPhase {
        if self.pending.is_some() {
            PollPhase::Scheduled
        } else if self.in_flight > 0 {
            PollPhase::Fetching
        } else {
            PollPhase::Idle
        }
    }

    /// Number of pending timers; never more than one.
    pub fn pending_timers(&self) -> usize {
        usize::from(self.pending.is_some())
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.map(|t| t.due)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn current_chain(&self) -> u64 {
        self.chain
    }

    /// Why the current chain stopped, if it failed.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }
}
