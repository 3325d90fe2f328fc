//! Process status and exit types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,
    /// Signal that terminated the process (Unix only)
    #[cfg(unix)]
    pub signal: Option<i32>,
}

impl ExitStatus {
    /// Returns true if the process exited successfully (code 0)
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Returns true if the process was terminated by a signal
    pub fn terminated_by_signal(&self) -> bool {
        #[cfg(unix)]
        {
            self.signal.is_some()
        }
        #[cfg(not(unix))]
        {
            false
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            #[cfg(unix)]
            signal: {
                use std::os::unix::process::ExitStatusExt;
                status.signal()
            },
        }
    }
}

/// Outcome of waiting on a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitResult {
    /// The process exited and has now been reaped
    Exited(ExitStatus),
    /// The process was already reaped by an earlier call
    NotRunning,
}

impl ExitResult {
    /// The exit code, if this call reaped a process that exited normally
    pub fn code(&self) -> Option<i32> {
        match self {
            ExitResult::Exited(status) => status.code,
            ExitResult::NotRunning => None,
        }
    }

    /// The exit status, if this call reaped the process
    pub fn status(&self) -> Option<&ExitStatus> {
        match self {
            ExitResult::Exited(status) => Some(status),
            ExitResult::NotRunning => None,
        }
    }
}

/// A single snapshot of the process state
///
/// Every field comes from the same OS query. Two snapshots taken one after
/// the other may disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStatus {
    /// The command line the process was started with
    pub command: String,
    /// The process ID
    pub pid: u32,
    /// Whether the process was still running when observed
    pub running: bool,
    /// Exit code, once the process has exited normally
    pub exit_code: Option<i32>,
    /// Terminating signal, once the process has been killed by one
    pub signal: Option<i32>,
    /// When the snapshot was taken
    pub observed_at: DateTime<Utc>,
}

/// One of the three standard streams connected to the child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    /// The child's input
    Stdin,
    /// The child's output
    Stdout,
    /// The child's error output
    Stderr,
}

impl Stream {
    /// The conventional name of the stream
    pub fn name(&self) -> &'static str {
        match self {
            Stream::Stdin => "stdin",
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_result_code() {
        let exited = ExitResult::Exited(ExitStatus {
            code: Some(3),
            #[cfg(unix)]
            signal: None,
        });
        assert_eq!(exited.code(), Some(3));
        assert!(!exited.status().unwrap().success());

        assert_eq!(ExitResult::NotRunning.code(), None);
        assert!(ExitResult::NotRunning.status().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_from_std() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait statuses: exit code lives in the high byte, signal in the low bits
        let status = ExitStatus::from(std::process::ExitStatus::from_raw(7 << 8));
        assert_eq!(status.code, Some(7));
        assert!(!status.terminated_by_signal());

        let status = ExitStatus::from(std::process::ExitStatus::from_raw(15));
        assert_eq!(status.code, None);
        assert_eq!(status.signal, Some(15));
        assert!(status.terminated_by_signal());
    }

    #[test]
    fn test_stream_serializes_lowercase() {
        let json = serde_json::to_string(&Stream::Stderr).unwrap();
        assert_eq!(json, "\"stderr\"");
        assert_eq!(Stream::Stdin.to_string(), "stdin");
    }
}
