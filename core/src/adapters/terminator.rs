//! Process termination adapters.
//!
//! Both adapters deliver SIGKILL: termination is immediate, with no grace
//! period for the target process.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ports::Terminator;

use super::command::run_command;

/// Kills processes by running `kill -9 PID`.
#[derive(Debug, Clone)]
pub struct KillCommand {
    program: String,
    timeout: Duration,
}

impl KillCommand {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Terminator for KillCommand {
    async fn terminate(&self, pid: u32) -> Result<()> {
        debug!(pid = pid, program = %self.program, "Force killing process");

        let output = run_command(&self.program, ["-9".to_string(), pid.to_string()], self.timeout)
            .await?;

        if output.status.success() {
            debug!(pid = pid, "SIGKILL sent successfully");
            return Ok(());
        }

        let stderr = output.stderr.trim();
        warn!(pid = pid, stderr = stderr, "kill command failed");

        let reason = if stderr.is_empty() {
            format!("{} exited with {}", self.program, output.status)
        } else {
            stderr.to_string()
        };
        Err(Error::KillFailed { pid, reason })
    }
}

/// Kills processes by sending SIGKILL directly.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalTerminator;

#[cfg(unix)]
impl SignalTerminator {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl Terminator for SignalTerminator {
    async fn terminate(&self, pid: u32) -> Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // 0 and negative values address process groups, never a single process
        let raw = i32::try_from(pid)
            .ok()
            .filter(|&raw| raw > 0)
            .ok_or_else(|| Error::KillFailed {
                pid,
                reason: "invalid process id".to_string(),
            })?;

        debug!(pid = pid, "Sending SIGKILL");

        kill(Pid::from_raw(raw), Signal::SIGKILL).map_err(|errno| {
            warn!(pid = pid, error = %errno, "Failed to send SIGKILL");
            let reason = match errno {
                Errno::EPERM => "permission denied".to_string(),
                Errno::ESRCH => "no such process".to_string(),
                other => other.desc().to_string(),
            };
            Error::KillFailed { pid, reason }
        })
    }
}

/// Terminator chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum SystemTerminator {
    Command(KillCommand),
    #[cfg(unix)]
    Signal(SignalTerminator),
}

impl Terminator for SystemTerminator {
    async fn terminate(&self, pid: u32) -> Result<()> {
        match self {
            SystemTerminator::Command(inner) => inner.terminate(pid).await,
            #[cfg(unix)]
            SystemTerminator::Signal(inner) => inner.terminate(pid).await,
        }
    }
}
