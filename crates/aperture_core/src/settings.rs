use std::time::Duration;

/// Shortest trimmed query, in characters, that reaches the network.
pub const MIN_QUERY_CHARS: usize = 3;

/// Delays and thresholds the state machine schedules with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreSettings {
    pub search_debounce: Duration,
    pub reconnect_delay: Duration,
    pub ingest_settle: Duration,
    pub min_query_chars: usize,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            reconnect_delay: Duration::from_millis(3000),
            ingest_settle: Duration::from_millis(5000),
            min_query_chars: MIN_QUERY_CHARS,
        }
    }
}
