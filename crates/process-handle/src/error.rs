//! Error types for process handles

use crate::process::Stream;
use thiserror::Error;

/// Unified error type for process handles
#[derive(Error, Debug)]
pub enum Error {
    /// One of the resources handed to the constructor was missing
    #[error("the parameter \"{parameter}\" must be {expected}, {received} was passed")]
    InvalidConstructionArgument {
        /// Name of the offending parameter
        parameter: &'static str,
        /// What the parameter should have been
        expected: &'static str,
        /// What was actually received
        received: &'static str,
    },

    /// The stream was closed by an earlier call
    #[error("{stream} is closed")]
    StreamClosed {
        /// Which of the three streams was accessed
        stream: Stream,
    },

    /// The process was already waited on and released
    #[error("process has already been reaped")]
    ProcessAlreadyReaped,

    /// Failed to spawn a process
    #[error("failed to spawn process: {reason}")]
    SpawnFailed {
        /// The reason for the spawn failure
        reason: String,
    },

    /// Command not found
    #[error("command not found: {command}")]
    CommandNotFound {
        /// The command that was not found
        command: String,
    },

    /// Failed to send signal to process
    #[error("failed to send signal {signal}: {reason}")]
    SignalFailed {
        /// The signal number that failed to send
        signal: i32,
        /// The reason for the signal failure
        reason: String,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a spawn failed error
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            reason: reason.into(),
        }
    }

    /// Create a signal failed error
    pub fn signal_failed(signal: i32, reason: impl Into<String>) -> Self {
        Self::SignalFailed {
            signal,
            reason: reason.into(),
        }
    }

    /// Create a stream closed error
    pub fn stream_closed(stream: Stream) -> Self {
        Self::StreamClosed { stream }
    }

    /// Create a construction error for a parameter that was not supplied
    pub(crate) fn missing(parameter: &'static str, expected: &'static str) -> Self {
        Self::InvalidConstructionArgument {
            parameter,
            expected,
            received: "nothing",
        }
    }

    /// Name of the constructor parameter this error refers to, if any
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            Error::InvalidConstructionArgument { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
