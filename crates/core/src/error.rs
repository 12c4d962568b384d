//! Error types for RingSTM
//!
//! The transaction protocol has exactly one failure mode: a conflict, which is
//! always recoverable by restarting the attempt. Everything else in this module
//! describes misuse of the API or a rejected configuration.

use std::fmt;
use thiserror::Error;

/// Why an attempt was aborted
///
/// Callers never need to distinguish these: every reason means "restart the
/// attempt". They are kept for logging, metrics, and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictReason {
    /// A commit at `version` wrote to something this attempt has read
    ReadSetOverlap {
        /// Version of the conflicting commit
        version: u64,
    },
    /// The ring wrapped past the attempt's snapshot before it could revalidate
    Rollover {
        /// Snapshot version whose history was lost
        snapshot: u64,
    },
    /// A busy-wait exceeded the configured spin limit
    SpinLimit,
    /// The transaction body asked for a restart
    Explicit,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::ReadSetOverlap { version } => {
                write!(f, "read set overlaps commit {}", version)
            }
            ConflictReason::Rollover { snapshot } => {
                write!(f, "ring rolled over snapshot {}", snapshot)
            }
            ConflictReason::SpinLimit => write!(f, "spin limit exceeded"),
            ConflictReason::Explicit => write!(f, "explicit abort"),
        }
    }
}

/// All RingSTM errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The attempt was aborted and must be restarted
    #[error("transaction conflict: {0}")]
    Conflict(ConflictReason),

    /// An operation was issued outside the Active state
    #[error("transaction not active ({status})")]
    NotActive {
        /// Name of the state the context was in
        status: &'static str,
    },

    /// Configuration rejected at construction
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed or rendered
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// I/O error while loading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for RingSTM operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Only conflicts are retryable; a fresh attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Check if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// The conflict reason, if this is a conflict
    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self {
            Error::Conflict(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigParse(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::ConfigParse(e.to_string())
    }
}
