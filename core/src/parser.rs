//! Parsing of port-listing tool output.
//!
//! The listing tool prints one header line followed by one line per
//! listening socket:
//!
//! ```text
//! COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
//! node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
//! ```
//!
//! Column spacing and trailing columns drift between tool versions, so lines
//! that cannot be understood are skipped rather than treated as errors.

use std::collections::HashSet;

use crate::domain::{PortProcess, Snapshot};

/// Number of columns in a complete listing line
/// (`COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME`).
pub const MIN_COLUMNS: usize = 9;

/// Parse raw listing output into a deduplicated snapshot sorted by port.
///
/// The first line is a header and is discarded. A data line is skipped when
/// it has fewer than [`MIN_COLUMNS`] columns, when its PID is not a positive
/// integer, or when its address carries no valid port. Records sharing both
/// port and PID keep their first occurrence; records sharing a port keep
/// their input order.
pub fn parse(raw: &str) -> Snapshot {
    let mut processes = Vec::new();
    let mut seen: HashSet<(u16, u32)> = HashSet::new();

    // Skip header line
    for line in raw.lines().skip(1) {
        let Some(process) = parse_line(line) else {
            continue;
        };

        // Deduplicate by (port, pid)
        if !seen.insert((process.port, process.pid)) {
            continue;
        }

        processes.push(process);
    }

    // Stable, so equal ports keep input order
    processes.sort_by_key(|p| p.port);
    processes
}

fn parse_line(line: &str) -> Option<PortProcess> {
    let components: Vec<&str> = line.split_whitespace().collect();
    if components.len() < MIN_COLUMNS {
        return None;
    }

    let process_name = unescape_name(components[0]);

    let pid: u32 = components[1].parse().ok().filter(|&pid| pid > 0)?;

    let port = extract_port(address_column(&components))?;

    Some(PortProcess::new(port, pid, process_name))
}

/// The local address column: the last column, unless it is a socket state
/// marker such as `(LISTEN)`, in which case the one before it.
fn address_column<'a>(components: &[&'a str]) -> &'a str {
    let last = components[components.len() - 1];
    if last.starts_with('(') && last.ends_with(')') {
        components[components.len() - 2]
    } else {
        last
    }
}

/// Extract the port from `*:PORT`, `IPV4:PORT` or `[IPV6]:PORT`.
///
/// Only the text after the final colon is considered, so the colons inside
/// a bracketed IPv6 host do not matter.
pub fn extract_port(address: &str) -> Option<u16> {
    let last_colon = address.rfind(':')?;
    address[last_colon + 1..]
        .parse::<u16>()
        .ok()
        .filter(|&port| port > 0)
}

/// Undo the byte escapes the listing tool applies to command names.
fn unescape_name(name: &str) -> String {
    name.replace("\\x20", " ") // Space
        .replace("\\x2f", "/") // Slash
}
