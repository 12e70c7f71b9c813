//! Error types for dashreel-av.

use std::time::Duration;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, running, or streaming a transcode.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// The transcode invocation could not be built from the given inputs.
    #[error("cannot build transcode pipeline: {0}")]
    Build(String),

    /// The transcoder process failed to start.
    #[error("failed to spawn {tool}: {message}")]
    Spawn { tool: String, message: String },

    /// The transcoder exited early or its output pipe failed mid-transfer.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    /// The transcoder could not be confirmed dead within the cleanup budget.
    #[error("process {pid:?} still running {budget:?} after termination was requested")]
    ProcessLeak { pid: Option<u32>, budget: Duration },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a pipeline build error.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create a spawn error.
    pub fn spawn(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spawn {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a stream interrupted error.
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::StreamInterrupted(message.into())
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            other => std::io::Error::other(other),
        }
    }
}
