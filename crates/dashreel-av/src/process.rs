//! Transcoder process supervision.
//!
//! A [`ProcessSupervisor`] spawns exactly one transcoder for one request and
//! hands back a [`RunningProcess`], which owns the child and its output pipe.
//! The child is released exactly once, on whichever exit path comes first:
//!
//! - [`RunningProcess::finish`] after end of stream (waits for the exit status)
//! - [`RunningProcess::cancel`] on explicit cancellation
//! - `Drop`, for everything else (client disconnect, panics, early returns)
//!
//! Termination sends `SIGTERM` (unix), waits [`SupervisorConfig::term_grace`],
//! then kills and waits up to [`SupervisorConfig::cleanup_budget`] for the
//! child to be reaped. A child that outlives the budget is reported as
//! [`Error::ProcessLeak`] and logged at error level.
//!
//! State changes are published on a [`tokio::sync::watch`] channel:
//!
//! ```text
//! Idle -> Starting -> Streaming -> Completed | Failed | Cancelled
//!            \-> Failed (spawn error)
//! ```

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::pipeline::TranscodePipeline;
use crate::{Error, Result};

/// Default time a child gets to exit after `SIGTERM` before it is killed.
pub const DEFAULT_TERM_GRACE: Duration = Duration::from_millis(500);

/// Default time allowed for a killed child to be reaped.
pub const DEFAULT_CLEANUP_BUDGET: Duration = Duration::from_secs(2);

/// Lifecycle state of one supervised transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Supervisor created, nothing spawned yet.
    Idle,
    /// Spawn in progress.
    Starting,
    /// Child running and its output pipe readable.
    Streaming,
    /// Output fully drained and the child exited successfully.
    Completed,
    /// Spawn failed, the child exited unsuccessfully, or its output broke.
    Failed,
    /// The consumer went away or cancellation was requested.
    Cancelled,
}

impl StreamState {
    /// Whether no further transitions can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Lowercase state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing budget for terminating a transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Time between `SIGTERM` and `SIGKILL`.
    pub term_grace: Duration,
    /// Time allowed for the child to be reaped, after kill or after end of output.
    pub cleanup_budget: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            term_grace: DEFAULT_TERM_GRACE,
            cleanup_budget: DEFAULT_CLEANUP_BUDGET,
        }
    }
}

/// Spawns and owns the lifecycle of a single transcoder run.
#[derive(Debug)]
pub struct ProcessSupervisor {
    config: SupervisorConfig,
    state: watch::Sender<StreamState>,
    cancel: CancellationToken,
}

impl ProcessSupervisor {
    /// Create an idle supervisor.
    pub fn new(config: SupervisorConfig) -> Self {
        let (state, _) = watch::channel(StreamState::Idle);
        Self {
            config,
            state,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `token` to cancel the stream from outside, e.g. on server shutdown.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Spawn the transcoder described by `pipeline`.
    ///
    /// Must be called from within a tokio runtime. There is a single spawn
    /// attempt; on failure the state becomes [`StreamState::Failed`] and no
    /// output is produced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the process cannot be started.
    pub fn start(self, pipeline: TranscodePipeline) -> Result<RunningProcess> {
        self.state.send_replace(StreamState::Starting);
        let tool = pipeline.program_name();

        tracing::debug!(
            "Spawning {} for {} {} input(s)",
            tool,
            pipeline.inputs().len(),
            pipeline.camera()
        );

        let mut child = match pipeline.command().spawn() {
            Ok(child) => child,
            Err(e) => {
                self.state.send_replace(StreamState::Failed);
                tracing::error!("Failed to spawn {}: {}", tool, e);
                return Err(Error::spawn(tool, e.to_string()));
            }
        };

        let pid = child.id();
        let Some(stdout) = child.stdout.take() else {
            self.state.send_replace(StreamState::Failed);
            let _ = child.start_kill();
            return Err(Error::spawn(tool, "stdout was not captured"));
        };

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(tool.clone(), pid, stderr));
        }

        self.state.send_replace(StreamState::Streaming);
        tracing::info!("{} started (pid {:?})", tool, pid);

        Ok(RunningProcess {
            child: Some(child),
            stdout: Some(stdout),
            pid,
            tool,
            state: self.state,
            cancel: self.cancel,
            config: self.config,
        })
    }
}

/// A spawned transcoder and its output pipe.
///
/// Dropping it terminates the child if it is still running.
#[derive(Debug)]
pub struct RunningProcess {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    pid: Option<u32>,
    tool: String,
    state: watch::Sender<StreamState>,
    cancel: CancellationToken,
    config: SupervisorConfig,
}

impl RunningProcess {
    /// OS process id of the child.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Current state.
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Token that cancels this stream when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The child's output pipe, until the process has been released.
    pub fn stdout_mut(&mut self) -> Option<&mut ChildStdout> {
        self.stdout.as_mut()
    }

    /// Release the process after its output reached end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamInterrupted`] if the child exited unsuccessfully
    /// or kept running after closing its output.
    pub async fn finish(mut self) -> Result<()> {
        self.stdout.take();
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        match timeout(self.config.cleanup_budget, child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                self.state.send_replace(StreamState::Completed);
                tracing::info!("{} (pid {:?}) completed", self.tool, self.pid);
                Ok(())
            }
            Ok(Ok(status)) => {
                self.state.send_replace(StreamState::Failed);
                tracing::warn!("{} (pid {:?}) exited with {}", self.tool, self.pid, status);
                Err(Error::interrupted(format!("{} exited with {}", self.tool, status)))
            }
            Ok(Err(e)) => {
                self.state.send_replace(StreamState::Failed);
                Err(Error::Io(e))
            }
            Err(_) => {
                self.state.send_replace(StreamState::Failed);
                tracing::warn!(
                    "{} (pid {:?}) closed its output but did not exit",
                    self.tool,
                    self.pid
                );
                if let Err(e) = terminate(child, &self.tool, self.config).await {
                    tracing::error!("{}", e);
                    return Err(e);
                }
                Err(Error::interrupted(format!(
                    "{} did not exit after closing its output",
                    self.tool
                )))
            }
        }
    }

    /// Cancel the stream and terminate the child.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProcessLeak`] if the child could not be reaped in time.
    pub async fn cancel(mut self) -> Result<()> {
        self.stdout.take();
        let Some(child) = self.child.take() else {
            return Ok(());
        };

        self.state.send_replace(StreamState::Cancelled);
        tracing::info!("Cancelling {} (pid {:?})", self.tool, self.pid);
        let result = terminate(child, &self.tool, self.config).await;
        if let Err(ref e) = result {
            tracing::error!("{}", e);
        }
        result
    }
}

impl Drop for RunningProcess {
    fn drop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        // Close our end of the pipe first so a blocked writer sees EPIPE.
        self.stdout.take();
        self.state.send_replace(StreamState::Cancelled);
        tracing::info!(
            "Stream consumer went away, terminating {} (pid {:?})",
            self.tool,
            self.pid
        );

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let tool = std::mem::take(&mut self.tool);
                let config = self.config;
                handle.spawn(async move {
                    if let Err(e) = terminate(child, &tool, config).await {
                        tracing::error!("{}", e);
                    }
                });
            }
            Err(_) => {
                // No runtime to reap on; kill now and let kill_on_drop cover the rest.
                if let Err(e) = child.start_kill() {
                    tracing::warn!("Failed to kill {} (pid {:?}): {}", self.tool, self.pid, e);
                }
            }
        }
    }
}

/// Stop a child and wait for it to be reaped.
async fn terminate(mut child: Child, tool: &str, config: SupervisorConfig) -> Result<()> {
    let pid = child.id();

    if let Ok(Some(status)) = child.try_wait() {
        tracing::debug!("{} (pid {:?}) already exited with {}", tool, pid, status);
        return Ok(());
    }

    #[cfg(unix)]
    {
        if let Some(raw) = pid {
            match request_exit(raw) {
                Ok(()) => {
                    if let Ok(Ok(status)) = timeout(config.term_grace, child.wait()).await {
                        tracing::debug!("{} (pid {}) exited with {} after SIGTERM", tool, raw, status);
                        return Ok(());
                    }
                }
                Err(e) => tracing::debug!("SIGTERM to {} (pid {}) failed: {}", tool, raw, e),
            }
        }
    }

    if let Err(e) = child.start_kill() {
        tracing::warn!("Failed to kill {} (pid {:?}): {}", tool, pid, e);
    }

    match timeout(config.cleanup_budget, child.wait()).await {
        Ok(Ok(status)) => {
            tracing::debug!("{} (pid {:?}) killed, exit {}", tool, pid, status);
            Ok(())
        }
        Ok(Err(e)) => Err(Error::Io(e)),
        Err(_) => Err(Error::ProcessLeak {
            pid,
            budget: config.cleanup_budget,
        }),
    }
}

#[cfg(unix)]
fn request_exit(pid: u32) -> nix::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = i32::try_from(pid).map_err(|_| nix::errno::Errno::ESRCH)?;
    kill(Pid::from_raw(pid), Signal::SIGTERM)
}

/// Forward the transcoder's diagnostics into our logs.
///
/// Reads to EOF whatever the bytes are: closing the pipe early would kill the
/// transcoder with `SIGPIPE` on its next diagnostic.
async fn forward_stderr(tool: String, pid: Option<u32>, stderr: ChildStderr) {
    let mut reader = BufReader::new(stderr);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                tracing::warn!("[{} pid {:?}] {}", tool, pid, text.trim_end());
            }
            Err(e) => {
                tracing::debug!("Stopped reading {} stderr: {}", tool, e);
                break;
            }
        }
    }
}
