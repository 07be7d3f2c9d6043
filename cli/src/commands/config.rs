//! Config command - show the effective configuration.

use anyhow::Result;
use portsnipe_core::{Config, ConfigStore, KillMethod};

pub fn show(store: &ConfigStore, config: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let kill_method = match config.kill_method {
        KillMethod::Command => "command",
        KillMethod::Signal => "signal",
    };
    let refresh = match config.refresh_interval {
        0 => "disabled".to_string(),
        secs => format!("{}s", secs),
    };

    println!("Config file:      {}", store.path().display());
    println!("Refresh interval: {}", refresh);
    println!("Command timeout:  {}ms", config.command_timeout_ms);
    println!("Listing program:  {}", config.listing_program);
    println!("Kill program:     {}", config.kill_program);
    println!("Kill method:      {}", kill_method);
    Ok(())
}
