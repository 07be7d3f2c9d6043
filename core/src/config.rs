//! Configuration for the controller and the external tools it runs.
//!
//! Read from JSON at `~/.portsnipe/config.json`. Every field has a default,
//! so a missing file or a partial file is fine. The file is never written.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::adapters::{KillCommand, LsofListing, SystemTerminator};
use crate::controller::ControllerOptions;
use crate::error::{Error, Result};

/// How processes are terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KillMethod {
    /// Run the configured kill program (`kill -9 PID`).
    #[default]
    Command,
    /// Send SIGKILL directly (Unix only).
    Signal,
}

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Port scan refresh interval in seconds. 0 disables auto-refresh.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Upper bound on any external command, in milliseconds.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Program used to list listening sockets.
    #[serde(default = "default_listing_program")]
    pub listing_program: String,

    /// Program used to kill processes when `kill_method` is `command`.
    #[serde(default = "default_kill_program")]
    pub kill_program: String,

    #[serde(default)]
    pub kill_method: KillMethod,
}

fn default_refresh_interval() -> u64 {
    5
}

fn default_command_timeout_ms() -> u64 {
    3000
}

fn default_listing_program() -> String {
    if cfg!(target_os = "macos") {
        "/usr/sbin/lsof".to_string()
    } else {
        "lsof".to_string()
    }
}

fn default_kill_program() -> String {
    "/bin/kill".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            command_timeout_ms: default_command_timeout_ms(),
            listing_program: default_listing_program(),
            kill_program: default_kill_program(),
            kill_method: KillMethod::default(),
        }
    }
}

impl Config {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// The auto-refresh period, or `None` when auto-refresh is disabled.
    pub fn refresh_period(&self) -> Option<Duration> {
        (self.refresh_interval > 0).then(|| Duration::from_secs(self.refresh_interval))
    }

    /// Controller options with auto-refresh as configured.
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            refresh_interval: self.refresh_period(),
        }
    }

    /// The listing adapter described by this configuration.
    pub fn listing(&self) -> LsofListing {
        LsofListing::new(self.listing_program.clone(), self.command_timeout())
    }

    /// The terminator described by this configuration.
    pub fn terminator(&self) -> Result<SystemTerminator> {
        match self.kill_method {
            KillMethod::Command => Ok(SystemTerminator::Command(KillCommand::new(
                self.kill_program.clone(),
                self.command_timeout(),
            ))),
            #[cfg(unix)]
            KillMethod::Signal => Ok(SystemTerminator::Signal(
                crate::adapters::SignalTerminator::new(),
            )),
            #[cfg(not(unix))]
            KillMethod::Signal => Err(Error::Config(
                "killMethod \"signal\" is only supported on Unix".to_string(),
            )),
        }
    }
}

/// Read-only access to the configuration file.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portsnipe/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portsnipe").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }
}
