//! Bounded execution of external commands.

use std::ffi::OsStr;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Captured result of a finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Turn an unsuccessful exit into [`Error::NonZeroExit`].
    pub fn into_success(self, program: &str) -> Result<String> {
        if self.status.success() {
            Ok(self.stdout)
        } else {
            Err(Error::NonZeroExit {
                program: program.to_string(),
                code: self.status.code(),
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Run `program` with `args`, waiting at most `timeout` for it to finish.
///
/// The child is killed if the deadline passes. Output that is not valid
/// UTF-8 is decoded lossily.
pub async fn run_command<I, S>(program: &str, args: I, timeout: Duration) -> Result<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(program = program, timeout_ms = timeout.as_millis() as u64, "Running command");

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!(program = program, error = %e, "Failed to run command");
            return Err(Error::CommandFailed(format!("Failed to run {}: {}", program, e)));
        }
        Err(_) => {
            warn!(program = program, "Command timed out");
            return Err(Error::Timeout {
                program: program.to_string(),
                timeout,
            });
        }
    };

    debug!(program = program, status = %output.status, "Command finished");

    Ok(CommandOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
