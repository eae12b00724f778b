//! Probe and run result models

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Kind of transport-level failure seen while probing a proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportError {
    /// The candidate could not be turned into a proxy URL
    InvalidProxy(String),
    /// Connecting to the proxy or through it failed
    Connect(String),
    /// No response within the probe timeout
    Timeout,
    /// Any other request failure (TLS, protocol, body, ...)
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::InvalidProxy(msg) => write!(f, "invalid proxy: {}", msg),
            TransportError::Connect(msg) => write!(f, "connect error: {}", msg),
            TransportError::Timeout => write!(f, "timed out"),
            TransportError::Other(msg) => write!(f, "request error: {}", msg),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Classification of a single probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    /// The probe endpoint answered with 200
    Success,
    /// A response arrived with any other status code
    BadStatus(u16),
    /// The request never produced a response
    Error(TransportError),
}

/// Outcome of probing one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub proxy: String,
    pub status: ProbeStatus,
    /// Start-to-finish time, measured for failures as well
    pub elapsed: Duration,
}

impl ProbeOutcome {
    pub fn success(proxy: String, elapsed: Duration) -> Self {
        Self {
            proxy,
            status: ProbeStatus::Success,
            elapsed,
        }
    }

    pub fn bad_status(proxy: String, code: u16, elapsed: Duration) -> Self {
        Self {
            proxy,
            status: ProbeStatus::BadStatus(code),
            elapsed,
        }
    }

    pub fn error(proxy: String, error: TransportError, elapsed: Duration) -> Self {
        Self {
            proxy,
            status: ProbeStatus::Error(error),
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ProbeStatus::Success)
    }
}

/// A validated proxy together with the response time it was measured at.
///
/// Equality covers both fields, so one proxy probed twice with different
/// timings yields two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidEntry {
    pub proxy: String,
    pub response_time: Duration,
}

impl ValidEntry {
    pub fn new(proxy: String, response_time: Duration) -> Self {
        Self {
            proxy,
            response_time,
        }
    }
}

impl fmt::Display for ValidEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.3}s)",
            self.proxy,
            self.response_time.as_secs_f64()
        )
    }
}

/// Final state of a run, taken from the last report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub valid: HashSet<ValidEntry>,
    pub invalid: HashSet<String>,
    /// Valid proxies per second over the whole run
    pub rate: f64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }
}
