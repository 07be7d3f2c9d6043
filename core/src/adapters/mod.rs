//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter talks to an external tool or the operating system.

pub mod command;
mod lsof;
mod terminator;

// Re-export main types for convenience
pub use command::{run_command, CommandOutput};
pub use lsof::LsofListing;
#[cfg(unix)]
pub use terminator::SignalTerminator;
pub use terminator::{KillCommand, SystemTerminator};
