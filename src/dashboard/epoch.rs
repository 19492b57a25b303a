//! Monotonic request epochs for discarding stale fetch responses.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Issues increasing tickets and decides whether a response may be applied.
///
/// Two rules are offered:
/// - [`RequestEpoch::is_current`]: only the most recently issued ticket wins.
///   Used by views, where each user action supersedes the previous one.
/// - [`RequestEpoch::try_advance`]: a response wins if it is newer than the
///   last one applied. Used by polling, where fetches overlap and waiting for
///   the latest one could starve the consumer.
#[derive(Debug, Default)]
pub struct RequestEpoch {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl RequestEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Record `ticket` as applied if nothing newer was applied before it.
    pub fn try_advance(&self, ticket: Ticket) -> bool {
        self.applied.fetch_max(ticket.0, Ordering::SeqCst) < ticket.0
    }
}
