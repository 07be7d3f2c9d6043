//! portsnipe Core Library
//!
//! Lists processes listening on local TCP ports and terminates them.
//! Provides functionality to:
//! - Parse port-listing tool output into deduplicated, sorted records
//! - Force kill processes by PID
//! - Keep a published snapshot fresh with a periodic background scan
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models
//! - `parser`: Pure parsing of listing tool output
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External tool implementations
//! - `controller`: Single-owner state actor serving scans and kills
//!
//! # Platform Support
//! - macOS and Linux: Uses `lsof` for listing, `kill` or SIGKILL for termination

pub mod adapters;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod parser;
pub mod ports;

// Re-export domain types (primary API)
pub use domain::{common_port_label, PortProcess, Snapshot, COMMON_PORTS};

// Re-export other commonly used types
pub use adapters::{KillCommand, LsofListing, SystemTerminator};
pub use config::{Config, ConfigStore, KillMethod};
pub use controller::{ControllerOptions, ControllerState, PortController};
pub use error::{Error, Result};
pub use parser::parse;
pub use ports::{ListingTool, Terminator};

/// Controller wired to the system listing and termination tools.
pub type SystemController = PortController<LsofListing, SystemTerminator>;

/// Build a controller from configuration on the current tokio runtime.
pub fn system_controller(config: &Config, options: ControllerOptions) -> Result<SystemController> {
    Ok(PortController::spawn(
        config.listing(),
        config.terminator()?,
        options,
    ))
}
