//! Example: Scan and display all listening ports.

use portsnipe_core::{system_controller, Config, ControllerOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("Scanning ports...\n");

    let controller = match system_controller(&Config::default(), ControllerOptions::manual()) {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("Error creating controller: {}", e);
            return;
        }
    };

    let processes = controller.scan_all().await;

    if let Some(error) = controller.last_error() {
        eprintln!("Error scanning ports: {}", error);
        return;
    }

    if processes.is_empty() {
        println!("No listening ports found.");
        return;
    }

    println!("{:<6} {:<8} {}", "PORT", "PID", "PROCESS");
    println!("{}", "-".repeat(40));

    for process in &processes {
        println!(
            "{:<6} {:<8} {}",
            process.port,
            process.pid,
            process.display_name()
        );
    }

    println!("\nTotal: {} ports", processes.len());
}
