//! Listening process domain model.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A snapshot of listening processes, ascending by port.
pub type Snapshot = Vec<PortProcess>;

/// A process bound to a listening TCP port.
///
/// Two records are the same listener when `port` and `pid` match. The
/// process name is a label only: listing tools may report the same process
/// differently from one call to the next.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortProcess {
    /// The port number (1-65535).
    pub port: u16,
    /// Process ID of the owning process (never 0).
    pub pid: u32,
    /// Short name of the owning process. May be empty.
    pub process_name: String,
}

impl PortProcess {
    pub fn new(port: u16, pid: u32, process_name: impl Into<String>) -> Self {
        Self {
            port,
            pid,
            process_name: process_name.into(),
        }
    }

    /// Name to show for this process, falling back to the PID.
    pub fn display_name(&self) -> String {
        if self.process_name.is_empty() {
            format!("PID {}", self.pid)
        } else {
            self.process_name.clone()
        }
    }

    /// Get the formatted port number for display (e.g., ":3000").
    pub fn display_port(&self) -> String {
        format!(":{}", self.port)
    }

    /// Check if this record matches a search query.
    ///
    /// Matches against the port number, PID, and process name
    /// (case-insensitive).
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.port.to_string().contains(&query)
            || self.pid.to_string().contains(&query)
            || self.process_name.to_lowercase().contains(&query)
    }
}

impl PartialEq for PortProcess {
    fn eq(&self, other: &Self) -> bool {
        self.port == other.port && self.pid == other.pid
    }
}

impl Hash for PortProcess {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.port.hash(state);
        self.pid.hash(state);
    }
}
