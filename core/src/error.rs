//! Error types for the portsnipe-core library.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for portsnipe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while listing ports or terminating processes.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to start a system command (missing executable, spawn failure).
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// A system command ran but exited unsuccessfully.
    #[error("{program} exited with status {code:?}: {stderr}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// A system command did not finish within its time budget.
    #[error("{program} timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    /// Failed to kill a process.
    #[error("Failed to kill process {pid}: {reason}")]
    KillFailed { pid: u32, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
