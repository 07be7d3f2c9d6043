//! Process terminator port (interface).

use crate::error::Result;

/// Port for terminating processes.
///
/// Termination is forced and immediate: there is no graceful phase and no
/// confirmation step.
pub trait Terminator: Send + Sync {
    /// Kill the process with the given PID.
    fn terminate(&self, pid: u32) -> impl std::future::Future<Output = Result<()>> + Send;
}
