use std::time::Duration;

use crate::SearchSeq;

/// One-shot timers the core schedules through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    SearchDebounce,
    LogReconnect,
    IngestSettle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartBackend,
    StopBackend,
    ConnectLog,
    /// Replaces any pending timer of the same kind.
    StartTimer {
        timer: Timer,
        generation: u64,
        delay: Duration,
    },
    CancelTimer {
        timer: Timer,
    },
    IssueSearch {
        seq: SearchSeq,
        query: String,
    },
    FetchJobs,
    TriggerIngest,
}
