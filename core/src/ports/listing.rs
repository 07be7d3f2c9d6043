//! Port listing tool port (interface).

use crate::error::Result;

/// Port for the external tool that lists listening TCP sockets.
///
/// Implementations return the tool's raw text output; turning it into
/// records is the job of [`crate::parser::parse`]. Any tool producing the
/// same tabular layout can stand in for another.
pub trait ListingTool: Send + Sync {
    /// List every listening TCP socket.
    fn list_all(&self) -> impl std::future::Future<Output = Result<String>> + Send;

    /// List the listening TCP sockets bound to `port`.
    fn list_port(&self, port: u16) -> impl std::future::Future<Output = Result<String>> + Send;
}
