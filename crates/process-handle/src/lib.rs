//! Blocking handle over a spawned child process and its three pipes
//!
//! [`ProcessHandle::spawn`] runs a command line through the platform shell
//! with stdin, stdout and stderr piped. The handle writes to stdin, reads
//! stdout and stderr, reports status and terminates the child. Dropping it
//! closes the pipes and reaps the child, so neither leaks.
//!
//! ```no_run
//! use process_handle::ProcessHandle;
//!
//! # fn main() -> process_handle::Result<()> {
//! let mut cat = ProcessHandle::spawn("cat")?;
//! cat.write_all("hello\n")?;
//! assert_eq!(cat.read_line()?, b"hello\n");
//! cat.close_stdin();
//! assert_eq!(cat.stop()?.code(), Some(0));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod handle;
pub mod pipe;
pub mod process;

pub use command::Command;
pub use error::{Error, Result};
pub use handle::{ProcessHandle, Signal};
pub use process::{ExitResult, ExitStatus, ProcessStatus, Stream};
