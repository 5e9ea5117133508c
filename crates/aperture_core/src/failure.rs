use std::fmt;

/// Why a request against the backend produced no usable payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Unreachable(String),
    HttpStatus(u16),
    Timeout,
    Malformed(String),
}

impl FetchFailure {
    /// Malformed payloads render as an empty result set rather than an error.
    pub fn is_malformed(&self) -> bool {
        matches!(self, FetchFailure::Malformed(_))
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Unreachable(detail) => {
                write!(f, "backend unreachable ({detail}). Is the backend running?")
            }
            FetchFailure::HttpStatus(code) => write!(f, "backend returned HTTP {code}"),
            FetchFailure::Timeout => write!(f, "request timed out"),
            FetchFailure::Malformed(detail) => write!(f, "malformed response: {detail}"),
        }
    }
}
