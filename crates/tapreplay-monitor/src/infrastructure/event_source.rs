//! The child process producing the raw event stream.
//!
//! By default this is `adb [-s SERIAL] shell getevent -l DEVICE`.  Any other
//! command writing `getevent -l` formatted lines to stdout works as well
//! (a configured argv override, or `cat` of a captured transcript).
//!
//! stdout is handed to the stream pump.  stderr is drained on a background
//! task from the moment the process starts, so a chatty child can never block
//! on a full pipe, and surfaced in the final [`SourceReport`].

use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Error type for the event source process.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("event source command is empty")]
    EmptyCommand,

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("event source stdout was already taken")]
    StdoutTaken,

    #[error("failed to stop event source: {0}")]
    Kill(#[source] std::io::Error),

    #[error("failed to wait for event source: {0}")]
    Wait(#[source] std::io::Error),
}

/// Program and arguments of the event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCommand {
    program: String,
    args: Vec<String>,
}

impl SourceCommand {
    /// `ADB [-s SERIAL] shell getevent -l DEVICE`.
    pub fn getevent(adb_path: &str, serial: Option<&str>, device: &str) -> Self {
        let mut args = Vec::new();
        if let Some(serial) = serial {
            args.push("-s".to_string());
            args.push(serial.to_string());
        }
        args.extend(["shell", "getevent", "-l", device].map(str::to_string));
        Self {
            program: adb_path.to_string(),
            args,
        }
    }

    /// An explicit argv; the first element is the program.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::EmptyCommand`] if `argv` is empty.
    pub fn from_argv(argv: Vec<String>) -> Result<Self, SourceError> {
        let mut argv = argv.into_iter();
        let program = argv.next().ok_or(SourceError::EmptyCommand)?;
        Ok(Self {
            program,
            args: argv.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl std::fmt::Display for SourceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How the source process ended.
#[derive(Debug)]
pub struct SourceReport {
    pub status: ExitStatus,
    /// Everything the process wrote to stderr, lossily decoded.
    pub stderr: String,
}

/// A running event source process.
pub struct EventSource {
    child: Child,
    stdout: Option<ChildStdout>,
    stderr_task: Option<JoinHandle<String>>,
}

impl EventSource {
    /// Starts `command` with piped stdout and stderr.  The process is killed
    /// if the handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Spawn`] if the program cannot be started.
    pub fn spawn(command: &SourceCommand) -> Result<Self, SourceError> {
        let mut child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SourceError::Spawn {
                program: command.program().to_string(),
                source,
            })?;

        info!(pid = child.id(), "started event source: {command}");

        let stdout = child.stdout.take();
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut bytes = Vec::new();
                if let Err(e) = stderr.read_to_end(&mut bytes).await {
                    debug!("reading event source stderr failed: {e}");
                }
                String::from_utf8_lossy(&bytes).into_owned()
            })
        });

        Ok(Self {
            child,
            stdout,
            stderr_task,
        })
    }

    /// Hands out the stdout pipe.  Can only be taken once.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::StdoutTaken`] on the second call.
    pub fn take_stdout(&mut self) -> Result<ChildStdout, SourceError> {
        self.stdout.take().ok_or(SourceError::StdoutTaken)
    }

    /// Kills the process and reaps it.  Does nothing if it already exited.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Kill`] if the kill signal cannot be delivered.
    pub async fn terminate(&mut self) -> Result<(), SourceError> {
        if self.child.try_wait().map_err(SourceError::Wait)?.is_some() {
            return Ok(());
        }
        self.child.kill().await.map_err(SourceError::Kill)?;
        debug!("event source terminated");
        Ok(())
    }

    /// Waits for the process to exit and collects its stderr.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Wait`] if waiting on the process fails.
    pub async fn finish(mut self) -> Result<SourceReport, SourceError> {
        // Closing our end first lets a child blocked on a full stdout pipe exit.
        drop(self.stdout.take());
        let status = self.child.wait().await.map_err(SourceError::Wait)?;
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        Ok(SourceReport { status, stderr })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
