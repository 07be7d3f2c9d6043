//! List command - show all listening ports.

use anyhow::{bail, Result};
use portsnipe_core::{system_controller, Config, ControllerOptions};

use super::print_table;

pub async fn run(
    config: &Config,
    port_filter: Option<u16>,
    name_filter: Option<String>,
    json: bool,
) -> Result<()> {
    let controller = system_controller(config, ControllerOptions::manual())?;
    let mut processes = controller.scan_all().await;

    if let Some(error) = controller.last_error() {
        bail!("Scan failed: {}", error);
    }

    // Apply filters
    if let Some(p) = port_filter {
        processes.retain(|process| process.port == p);
    }
    if let Some(ref name) = name_filter {
        let name_lower = name.to_lowercase();
        processes.retain(|process| process.process_name.to_lowercase().contains(&name_lower));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&processes)?);
        return Ok(());
    }

    print_table(&processes);
    Ok(())
}
