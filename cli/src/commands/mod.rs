//! Subcommand implementations.

pub mod check;
pub mod config;
pub mod kill;
pub mod list;
pub mod watch;

use portsnipe_core::{common_port_label, PortProcess};

/// Print processes as an aligned table.
pub fn print_table(processes: &[PortProcess]) {
    if processes.is_empty() {
        println!("No processes found on open ports.");
        return;
    }

    // Table header
    println!("{:<6} {:<8} {:<24} COMMON USE", "PORT", "PID", "PROCESS");
    println!("{}", "-".repeat(60));

    for process in processes {
        let name = truncate(&process.display_name(), 24);
        let label = common_port_label(process.port).unwrap_or("-");

        println!(
            "{:<6} {:<8} {:<24} {}",
            process.port, process.pid, name, label
        );
    }

    println!("\nTotal: {} ports", processes.len());
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}
