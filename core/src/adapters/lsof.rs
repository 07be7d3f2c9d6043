//! Port listing through `lsof`.

use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::ports::ListingTool;

use super::command::run_command;

/// Lists listening TCP sockets with `lsof`.
///
/// Executes: `lsof -iTCP -sTCP:LISTEN -P -n`
///
/// Flags explained:
/// - -iTCP: Show only TCP connections (-iTCP:PORT for a single port)
/// - -sTCP:LISTEN: Show only listening sockets
/// - -P: Show port numbers (don't resolve to service names)
/// - -n: Show IP addresses (don't resolve to hostnames)
#[derive(Debug, Clone)]
pub struct LsofListing {
    program: String,
    timeout: Duration,
}

impl LsofListing {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn list(&self, selector: String) -> Result<String> {
        let args = [selector.as_str(), "-sTCP:LISTEN", "-P", "-n"];
        let output = run_command(&self.program, args, self.timeout).await?;

        // lsof exits 1 silently when no socket matches; anything on stderr is a real failure
        if output.status.code() == Some(1)
            && output.stdout.trim().is_empty()
            && output.stderr.trim().is_empty()
        {
            debug!(selector = %selector, "No listening sockets matched");
            return Ok(String::new());
        }

        output.into_success(&self.program)
    }
}

impl ListingTool for LsofListing {
    async fn list_all(&self) -> Result<String> {
        self.list("-iTCP".to_string()).await
    }

    async fn list_port(&self, port: u16) -> Result<String> {
        self.list(format!("-iTCP:{}", port)).await
    }
}
