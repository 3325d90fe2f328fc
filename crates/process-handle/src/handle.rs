//! The process handle
//!
//! A [`ProcessHandle`] owns one child process together with the three pipes
//! connected to it. Every operation blocks the calling thread until it is
//! done; the async endpoints from `async-process` are driven with
//! [`block_on`]. The handle spawns no tasks or threads of its own, though
//! `async-process` and `async-io` run process-wide reaper and reactor threads
//! shared by every child.
//!
//! Dropping a handle closes the streams and then reaps the child, in that
//! order. Closing stdin first lets an interactive child see end of input and
//! exit by itself, so the wait that follows does not hang.

use async_process::{Child, ChildStderr, ChildStdin, ChildStdout};
use chrono::Utc;
use futures_lite::future::block_on;
use std::fmt;
use std::io;
use tracing::{debug, warn};

use crate::command::Command;
use crate::error::{Error, Result};
use crate::pipe::{InputPipe, OutputPipe, StderrPipe, StdoutPipe};
use crate::process::{ExitResult, ExitStatus, ProcessStatus, Stream};

#[cfg(unix)]
pub use nix::sys::signal::Signal;

/// Signals that can be delivered where POSIX signals do not exist
///
/// Both are carried out as a forced kill.
#[cfg(not(unix))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Request termination
    SIGTERM,
    /// Force termination
    SIGKILL,
}

/// Owns a spawned process and its stdin, stdout and stderr
pub struct ProcessHandle {
    process: Child,
    stdin: InputPipe,
    stdout: StdoutPipe,
    stderr: StderrPipe,
    command: String,
    streams_open: bool,
    process_closed: bool,
    /// Set once a status query has seen the process exit
    exited: Option<ExitStatus>,
    kill_on_drop: bool,
}

impl ProcessHandle {
    /// Build a handle from a child process and its three pipes
    ///
    /// The process is checked first, then stdin, stdout and stderr. The
    /// first one missing fails construction with
    /// [`Error::InvalidConstructionArgument`] naming it.
    pub fn new(
        process: Option<Child>,
        stdin: Option<ChildStdin>,
        stdout: Option<ChildStdout>,
        stderr: Option<ChildStderr>,
    ) -> Result<Self> {
        let process = process.ok_or_else(|| Error::missing("process", "a child process"))?;
        let stdin = stdin.ok_or_else(|| Error::missing("stdin", "a writable stream"))?;
        let stdout = stdout.ok_or_else(|| Error::missing("stdout", "a readable stream"))?;
        let stderr = stderr.ok_or_else(|| Error::missing("stderr", "a readable stream"))?;

        Ok(Self {
            process,
            stdin: InputPipe::new(stdin),
            stdout: OutputPipe::new(Stream::Stdout, stdout),
            stderr: OutputPipe::new(Stream::Stderr, stderr),
            command: String::new(),
            streams_open: true,
            process_closed: false,
            exited: None,
            kill_on_drop: false,
        })
    }

    /// Build a handle from a child spawned with all three streams piped
    pub fn from_child(mut child: Child, command: impl Into<String>) -> Result<Self> {
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let mut handle = Self::new(Some(child), stdin, stdout, stderr)?;
        handle.command = command.into();
        Ok(handle)
    }

    /// Run a command line through the platform shell
    pub fn spawn(command_line: &str) -> Result<Self> {
        Self::spawn_with(&Command::new(command_line))
    }

    /// Spawn a fully configured command
    pub fn spawn_with(command: &Command) -> Result<Self> {
        let child = command.prepare().spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound && command.get_current_dir().is_none() {
                Error::CommandNotFound {
                    command: command.get_shell().0.to_string(),
                }
            } else {
                Error::spawn_failed(format!(
                    "Failed to spawn `{}`: {}",
                    command.get_command_line(),
                    e
                ))
            }
        })?;

        let mut handle = Self::from_child(child, command.get_command_line())?;
        handle.kill_on_drop = command.get_kill_on_drop();

        debug!(pid = handle.process.id(), command = %handle.command, "spawned process");
        Ok(handle)
    }

    /// Write to stdin, returning how many bytes were accepted
    ///
    /// The count may be short when the pipe is full; retrying the rest is up
    /// to the caller (or use [`write_all`](Self::write_all)).
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> Result<usize> {
        block_on(self.stdin.write(data.as_ref()))
    }

    /// Write every byte to stdin
    pub fn write_all(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        block_on(self.stdin.write_all(data.as_ref()))
    }

    /// Read up to `max` bytes from stdout
    ///
    /// Blocks until some output is available. An empty result means the
    /// child closed its stdout. `max` only bounds the result, nothing is
    /// allocated up front; zero fails with `InvalidInput`.
    pub fn read(&mut self, max: usize) -> Result<Vec<u8>> {
        block_on(self.stdout.read(max))
    }

    /// Read one line from stdout, including its `\n`
    ///
    /// At end of stream the partial line (possibly empty) is returned.
    pub fn read_line(&mut self) -> Result<Vec<u8>> {
        block_on(self.stdout.read_line())
    }

    /// Read stdout until the child closes it
    ///
    /// Never returns for a child that keeps its stdout open.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        block_on(self.stdout.read_to_end())
    }

    /// Read up to `max` bytes from stderr
    pub fn read_error(&mut self, max: usize) -> Result<Vec<u8>> {
        block_on(self.stderr.read(max))
    }

    /// Read one line from stderr, including its `\n`
    pub fn read_error_line(&mut self) -> Result<Vec<u8>> {
        block_on(self.stderr.read_line())
    }

    /// Read stderr until the child closes it
    pub fn read_error_to_end(&mut self) -> Result<Vec<u8>> {
        block_on(self.stderr.read_to_end())
    }

    /// Close stdin only, signalling end of input to the child
    pub fn close_stdin(&mut self) {
        if block_on(self.stdin.close()) {
            debug!(pid = self.process.id(), "closed stdin");
        }
    }

    /// Close stdin, stdout and stderr, in that order
    ///
    /// Calling this again does nothing.
    pub fn close_streams(&mut self) {
        if !self.streams_open {
            return;
        }

        block_on(self.stdin.close());
        self.stdout.close();
        self.stderr.close();
        self.streams_open = false;

        debug!(pid = self.process.id(), "closed streams");
    }

    /// Wait for the process to exit and reap it
    ///
    /// Streams are left as they are; a child waiting on stdin will keep
    /// waiting unless [`close_stdin`](Self::close_stdin) or
    /// [`close_streams`](Self::close_streams) ran first. Once the process has
    /// been reaped this returns [`ExitResult::NotRunning`].
    pub fn stop(&mut self) -> Result<ExitResult> {
        if self.process_closed {
            return Ok(ExitResult::NotRunning);
        }

        let status = ExitStatus::from(block_on(self.process.status())?);
        self.process_closed = true;
        self.exited = Some(status);

        debug!(pid = self.process.id(), code = ?status.code, "reaped process");
        Ok(ExitResult::Exited(status))
    }

    /// Send `signal` to the process without waiting for it to exit
    ///
    /// Returns false when the process is already known to have exited.
    /// Use [`running`](Self::running) or [`stop`](Self::stop) to observe the
    /// outcome.
    pub fn signal_stop(&mut self, signal: Signal) -> Result<bool> {
        if self.process_closed || self.exited.is_some() {
            return Ok(false);
        }

        let pid = self.process.id();

        #[cfg(unix)]
        {
            use nix::sys::signal;
            use nix::unistd::Pid;

            signal::kill(Pid::from_raw(pid as i32), signal)
                .map_err(|e| Error::signal_failed(signal as i32, e.to_string()))?;
        }

        #[cfg(not(unix))]
        {
            self.process
                .kill()
                .map_err(|e| Error::signal_failed(-1, e.to_string()))?;
        }

        debug!(pid, ?signal, "signalled process");
        Ok(true)
    }

    /// Request graceful termination (SIGTERM)
    pub fn terminate(&mut self) -> Result<bool> {
        self.signal_stop(Signal::SIGTERM)
    }

    /// Force termination (SIGKILL)
    pub fn kill(&mut self) -> Result<bool> {
        self.signal_stop(Signal::SIGKILL)
    }

    /// Take one snapshot of the process state
    ///
    /// Fails with [`Error::ProcessAlreadyReaped`] after [`stop`](Self::stop).
    pub fn status(&mut self) -> Result<ProcessStatus> {
        if self.process_closed {
            return Err(Error::ProcessAlreadyReaped);
        }

        if self.exited.is_none() {
            self.exited = self.process.try_status()?.map(ExitStatus::from);
        }
        let exited = self.exited;

        Ok(ProcessStatus {
            command: self.command.clone(),
            pid: self.process.id(),
            running: exited.is_none(),
            exit_code: exited.and_then(|s| s.code),
            #[cfg(unix)]
            signal: exited.and_then(|s| s.signal),
            #[cfg(not(unix))]
            signal: None,
            observed_at: Utc::now(),
        })
    }

    /// Whether the process is still running
    pub fn running(&mut self) -> Result<bool> {
        Ok(self.status()?.running)
    }

    /// The process ID
    pub fn pid(&mut self) -> Result<u32> {
        Ok(self.status()?.pid)
    }

    /// The command line the process was started with
    ///
    /// Empty for handles built with [`new`](Self::new).
    pub fn command(&mut self) -> Result<String> {
        Ok(self.status()?.command)
    }

    /// The exit code, once the process has exited normally
    pub fn exit_code(&mut self) -> Result<Option<i32>> {
        Ok(self.status()?.exit_code)
    }

    /// The child's stdin, until it is closed
    pub fn stdin(&self) -> Option<&ChildStdin> {
        self.stdin.get_ref()
    }

    /// The child's stdout, until it is closed
    ///
    /// Bytes already buffered by earlier reads are not visible here.
    pub fn stdout(&self) -> Option<&ChildStdout> {
        self.stdout.get_ref()
    }

    /// The child's stderr, until it is closed
    pub fn stderr(&self) -> Option<&ChildStderr> {
        self.stderr.get_ref()
    }

    /// The child process, until it is reaped
    pub fn process(&self) -> Option<&Child> {
        (!self.process_closed).then_some(&self.process)
    }

    /// Whether [`close_streams`](Self::close_streams) has not run yet
    pub fn streams_open(&self) -> bool {
        self.streams_open
    }

    /// Whether the process has been reaped
    pub fn process_closed(&self) -> bool {
        self.process_closed
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.process.id())
            .field("command", &self.command)
            .field("stdin_open", &self.stdin.is_open())
            .field("stdout_open", &self.stdout.is_open())
            .field("stderr_open", &self.stderr.is_open())
            .field("process_closed", &self.process_closed)
            .finish()
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.close_streams();

        if self.kill_on_drop {
            if let Err(e) = self.kill() {
                warn!(pid = self.process.id(), error = %e, "failed to kill process on drop");
            }
        }

        if let Err(e) = self.stop() {
            warn!(pid = self.process.id(), error = %e, "failed to reap process on drop");
        }
    }
}
