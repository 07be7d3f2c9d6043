//! Domain layer - Pure data models.
//!
//! This module contains the records produced by a port scan.
//! These types have no I/O dependencies and can be tested in isolation.

mod common_ports;
mod process;

// Re-export all domain types
pub use common_ports::{common_port_label, COMMON_PORTS};
pub use process::{PortProcess, Snapshot};
