//! Check command - look up the listener on one port.

use anyhow::Result;
use portsnipe_core::{system_controller, Config, ControllerOptions};

pub async fn run(config: &Config, port: u16, json: bool) -> Result<()> {
    let controller = system_controller(config, ControllerOptions::manual())?;
    let found = controller.scan_port(port).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    match found {
        Some(process) => println!(
            "Port {}: {} (PID {})",
            process.port,
            process.display_name(),
            process.pid
        ),
        None => println!("Port {} is free", port),
    }

    Ok(())
}
