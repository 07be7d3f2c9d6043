//! Watch command - keep scanning and print changes.

use anyhow::Result;
use chrono::Local;
use portsnipe_core::controller::DEFAULT_REFRESH_INTERVAL;
use portsnipe_core::{system_controller, Config, ControllerOptions, ControllerState, PortProcess};
use tracing::debug;

use super::print_table;

pub async fn run(config: &Config, json: bool) -> Result<()> {
    let options = ControllerOptions {
        refresh_interval: Some(config.refresh_period().unwrap_or(DEFAULT_REFRESH_INTERVAL)),
    };
    let controller = system_controller(config, options)?;
    let mut updates = controller.subscribe();

    if !json {
        println!("Watching listening ports (Ctrl-C to stop)...");
    }

    let mut last_printed: Option<ControllerState> = None;
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if state.is_scanning || !has_news(last_printed.as_ref(), &state) {
                    continue;
                }
                print_state(&state, json)?;
                last_printed = Some(state);
            }
            _ = &mut interrupted => {
                debug!("Interrupted, stopping watch");
                break;
            }
        }
    }

    Ok(())
}

/// Whether a completed scan differs from what was last shown.
fn has_news(previous: Option<&ControllerState>, current: &ControllerState) -> bool {
    match previous {
        None => true,
        Some(previous) => {
            previous.last_error != current.last_error
                || !same_listeners(&previous.processes, &current.processes)
        }
    }
}

fn same_listeners(a: &[PortProcess], b: &[PortProcess]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x == y && x.process_name == y.process_name)
}

fn print_state(state: &ControllerState, json: bool) -> Result<()> {
    if json {
        let line = serde_json::json!({
            "time": Local::now().to_rfc3339(),
            "processes": state.processes,
            "error": state.last_error,
        });
        println!("{}", line);
        return Ok(());
    }

    println!("\n[{}]", Local::now().format("%H:%M:%S"));
    match &state.last_error {
        Some(error) => println!("Scan failed: {}", error),
        None => print_table(&state.processes),
    }
    Ok(())
}
