use std::fmt::{self, Debug, Display};
use std::io;

/// The single error type for everything that can fail in shipnet, with
/// conversions from the error types it wraps.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ShipnetError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    /// A rejected configuration: bad population sizes, rates outside their
    /// bounds, group sizes larger than the population. Raised before any
    /// network is built.
    Config(String),
    /// A violated internal invariant, e.g. a checkpoint network whose node
    /// set differs from the active network. Indicates a configuration bug,
    /// not a recoverable runtime condition.
    InvariantViolation(String),
}

impl From<io::Error> for ShipnetError {
    fn from(error: io::Error) -> Self {
        ShipnetError::IoError(error)
    }
}

impl From<serde_json::Error> for ShipnetError {
    fn from(error: serde_json::Error) -> Self {
        ShipnetError::JsonError(error)
    }
}

impl From<String> for ShipnetError {
    fn from(error: String) -> Self {
        ShipnetError::Config(error)
    }
}

impl From<&str> for ShipnetError {
    fn from(error: &str) -> Self {
        ShipnetError::Config(error.to_string())
    }
}

impl std::error::Error for ShipnetError {}

impl Display for ShipnetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShipnetError::IoError(e) => write!(f, "IO error: {e}"),
            ShipnetError::JsonError(e) => write!(f, "JSON error: {e}"),
            ShipnetError::Config(msg) => write!(f, "Configuration error: {msg}"),
            ShipnetError::InvariantViolation(msg) => write!(f, "Invariant violation: {msg}"),
        }
    }
}
