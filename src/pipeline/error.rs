//! Error types and reporting for pipeline stations.

use std::fmt;

/// Errors that can occur during station processing.
#[derive(Debug, Clone)]
pub enum StationError {
    /// Recoverable error; the station keeps processing subsequent inputs.
    Recoverable(String),
    /// Fatal error; the station shuts down.
    Fatal(String),
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            StationError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for StationError {}

/// Trait for reporting station errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a station.
    fn report(&self, station: &str, error: &StationError);
}

/// Simple error reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, station: &str, error: &StationError) {
        eprintln!("voxgate [{}] {}", station, error);
    }
}
