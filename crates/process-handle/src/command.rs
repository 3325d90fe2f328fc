//! Spawn configuration for process handles

use async_process::{Command as AsyncCommand, Stdio};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[cfg(unix)]
const DEFAULT_SHELL: &str = "sh";
#[cfg(unix)]
const DEFAULT_SHELL_FLAG: &str = "-c";
#[cfg(windows)]
const DEFAULT_SHELL: &str = "cmd";
#[cfg(windows)]
const DEFAULT_SHELL_FLAG: &str = "/C";

fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}

fn default_shell_flag() -> String {
    DEFAULT_SHELL_FLAG.to_string()
}

/// A command line to be spawned with all three standard streams piped
///
/// The command line is handed to the shell untouched: no escaping or
/// splitting happens here. Unlike `async_process::Command` this type is
/// `Clone` and can be loaded from configuration:
///
/// ```json
/// { "command_line": "cat", "env": { "LANG": "C" }, "kill_on_drop": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// The command line passed to the shell
    command_line: String,
    /// The shell program interpreting the command line
    #[serde(default = "default_shell")]
    shell: String,
    /// The flag telling the shell to run a command string
    #[serde(default = "default_shell_flag")]
    shell_flag: String,
    /// Environment variables to set
    #[serde(default)]
    env: HashMap<String, String>,
    /// Working directory for the command
    #[serde(default)]
    current_dir: Option<PathBuf>,
    /// Whether to clear the environment before setting our vars
    #[serde(default)]
    env_clear: bool,
    /// Whether dropping the handle force-kills the process before reaping it
    #[serde(default)]
    kill_on_drop: bool,
}

impl Command {
    /// Create a new command for the given command line
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
            shell: default_shell(),
            shell_flag: default_shell_flag(),
            env: HashMap::new(),
            current_dir: None,
            env_clear: false,
            kill_on_drop: false,
        }
    }

    /// Use a different shell, e.g. `("bash", "-c")`
    pub fn shell(&mut self, program: impl Into<String>, flag: impl Into<String>) -> &mut Self {
        self.shell = program.into();
        self.shell_flag = flag.into();
        self
    }

    /// Set an environment variable
    pub fn env(&mut self, key: impl Into<String>, val: impl Into<String>) -> &mut Self {
        self.env.insert(key.into(), val.into());
        self
    }

    /// Set multiple environment variables
    pub fn envs<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, val) in vars {
            self.env(key, val);
        }
        self
    }

    /// Clear all environment variables (except those explicitly set)
    pub fn env_clear(&mut self) -> &mut Self {
        self.env_clear = true;
        self
    }

    /// Set the working directory for the command
    pub fn current_dir<P: AsRef<Path>>(&mut self, dir: P) -> &mut Self {
        self.current_dir = Some(dir.as_ref().to_owned());
        self
    }

    /// Force-kill the process when its handle is dropped
    ///
    /// Without this, dropping a handle closes the streams and then waits for
    /// the process to exit on its own.
    pub fn kill_on_drop(&mut self, kill: bool) -> &mut Self {
        self.kill_on_drop = kill;
        self
    }

    /// Get the command line
    pub fn get_command_line(&self) -> &str {
        &self.command_line
    }

    /// Get the shell program and its command flag
    pub fn get_shell(&self) -> (&str, &str) {
        (&self.shell, &self.shell_flag)
    }

    /// Get the environment variables
    pub fn get_envs(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Get the current directory
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Whether the environment is cleared before spawning
    pub fn get_env_clear(&self) -> bool {
        self.env_clear
    }

    /// Whether dropping the handle force-kills the process
    pub fn get_kill_on_drop(&self) -> bool {
        self.kill_on_drop
    }

    /// Prepare this command for execution by converting to an `async_process::Command`
    ///
    /// All three standard streams are piped.
    pub fn prepare(&self) -> AsyncCommand {
        let mut cmd = AsyncCommand::new(&self.shell);
        cmd.arg(&self.shell_flag).arg(&self.command_line);

        if self.env_clear {
            cmd.env_clear();
        }
        for (key, val) in &self.env {
            cmd.env(key, val);
        }

        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        cmd
    }
}

impl From<&str> for Command {
    fn from(command_line: &str) -> Self {
        Command::new(command_line)
    }
}

impl From<String> for Command {
    fn from(command_line: String) -> Self {
        Command::new(command_line)
    }
}
