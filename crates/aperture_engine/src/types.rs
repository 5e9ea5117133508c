use std::fmt;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Timers the engine can schedule on behalf of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    SearchDebounce,
    LogReconnect,
    IngestSettle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    BackendStarted {
        pid: u32,
    },
    BackendSpawnFailed {
        message: String,
    },
    /// The backend answered its health endpoint.
    BackendReady,
    BackendExited {
        code: Option<i32>,
        requested: bool,
    },
    LogConnected,
    LogLine(String),
    LogDisconnected {
        reason: String,
    },
    SearchCompleted {
        seq: u64,
        result: Result<SearchResponse, ClientError>,
    },
    JobsFetched(Result<JobsResponse, ClientError>),
    IngestFinished(Result<(), ClientError>),
    TimerFired {
        timer: TimerKind,
        generation: u64,
    },
    /// Ctrl-C reached the host process.
    InterruptRequested,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<SearchResultItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResultItem {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub has_attachment: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobsResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<JobItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobItem {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Message ids are strings in the index but some routes hand back integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Int(value) => value.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientErrorKind {
    InvalidUrl,
    Unreachable,
    HttpStatus(u16),
    Timeout,
    Malformed,
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientErrorKind::InvalidUrl => write!(f, "invalid url"),
            ClientErrorKind::Unreachable => write!(f, "backend unreachable"),
            ClientErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ClientErrorKind::Timeout => write!(f, "timeout"),
            ClientErrorKind::Malformed => write!(f, "malformed response"),
        }
    }
}
