//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces the controller uses to interact
//! with external tools. Implementations live in `adapters`.

mod listing;
mod terminator;

pub use listing::ListingTool;
pub use terminator::Terminator;
