use std::collections::VecDeque;

/// Number of relayed log lines kept for display.
pub const LOG_BUFFER_LINES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Connection state machine for the backend's log stream.
///
/// `Disconnected -> Connecting -> Connected -> Disconnected`. At most one
/// attempt is outstanding: `begin_connect` refuses unless disconnected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct LogLink {
    state: LogConnectionState,
    retries: u32,
    connections: u64,
    last_disconnect: Option<String>,
    lines: VecDeque<String>,
    total_lines: u64,
}

impl LogLink {
    pub(crate) fn state(&self) -> LogConnectionState {
        self.state
    }

    pub(crate) fn retries(&self) -> u32 {
        self.retries
    }

    pub(crate) fn connections(&self) -> u64 {
        self.connections
    }

    pub(crate) fn last_disconnect(&self) -> Option<&str> {
        self.last_disconnect.as_deref()
    }

    pub(crate) fn lines(&self) -> impl Iterator<Item = &String> {
        self.lines.iter()
    }

    pub(crate) fn total_lines(&self) -> u64 {
        self.total_lines
    }

    pub(crate) fn begin_connect(&mut self) -> bool {
        if self.state != LogConnectionState::Disconnected {
            return false;
        }
        self.state = LogConnectionState::Connecting;
        true
    }

    /// Returns `true` when this is a fresh connection, i.e. a proactive sync is due.
    pub(crate) fn connected(&mut self) -> bool {
        if self.state == LogConnectionState::Connected {
            return false;
        }
        self.state = LogConnectionState::Connected;
        self.retries = 0;
        self.connections += 1;
        self.last_disconnect = None;
        true
    }

    /// Returns `true` when the link actually dropped and a reconnect is due.
    pub(crate) fn disconnected(&mut self, reason: String) -> bool {
        if self.state == LogConnectionState::Disconnected {
            return false;
        }
        self.state = LogConnectionState::Disconnected;
        self.retries = self.retries.saturating_add(1);
        self.last_disconnect = Some(reason);
        true
    }

    pub(crate) fn push_line(&mut self, line: String) {
        if self.lines.len() == LOG_BUFFER_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        self.total_lines += 1;
    }
}
