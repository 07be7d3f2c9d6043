//! Kill command - force kill the process on a port.

use anyhow::{bail, Result};
use portsnipe_core::{system_controller, Config, ControllerOptions};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KillReport {
    port: u16,
    killed: bool,
    port_free: bool,
    error: Option<String>,
}

pub async fn run(config: &Config, port: u16, json: bool) -> Result<()> {
    let controller = system_controller(config, ControllerOptions::manual())?;

    let killed = controller.kill_process_on_port(port).await;
    let error = controller.last_error();
    // A failed rescan leaves an empty snapshot that says nothing about the port
    let port_free = error.is_none() && !controller.snapshot().iter().any(|p| p.port == port);

    if json {
        let report = KillReport {
            port,
            killed,
            port_free: killed && port_free,
            error,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if killed {
        println!("Killed process on port {}", port);
        match (&error, port_free) {
            (Some(error), _) => eprintln!("Could not confirm port {} is free: {}", port, error),
            (None, true) => println!("Port {} is free", port),
            (None, false) => println!("Port {} is still in use", port),
        }
        return Ok(());
    }

    match error {
        Some(error) => bail!("{}", error),
        None => {
            println!("No process listening on port {}", port);
            Ok(())
        }
    }
}
