//! portsnipe CLI - List and kill processes on listening TCP ports
//!
//! A command-line front end for scanning listening ports, looking up
//! a single port, and force killing whatever listens on it.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use portsnipe_core::{Config, ConfigStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portsnipe")]
#[command(author, version, about = "List and kill processes on listening TCP ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Path to the configuration file (default: ~/.portsnipe/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// The minimum log level to display
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: tracing::Level,
}

#[derive(Subcommand)]
enum Commands {
    /// List all listening ports
    #[command(alias = "ls")]
    List {
        /// Filter by port number
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,

        /// Filter by process name
        #[arg(short = 'n', long)]
        name: Option<String>,
    },

    /// Show which process listens on a port
    Check {
        /// Port number to check
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,
    },

    /// Force kill the process listening on a port
    Kill {
        /// Port number to free
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,
    },

    /// Keep scanning and print the listening ports whenever they change
    Watch,

    /// Show current configuration
    Config,
}

fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load_config(path: Option<PathBuf>) -> anyhow::Result<(ConfigStore, Config)> {
    let store = match path {
        Some(path) => ConfigStore::with_path(path),
        None => ConfigStore::new()?,
    };
    let config = store.load().await?;
    Ok((store, config))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let (store, config) = load_config(cli.config).await?;

    match cli.command {
        Some(Commands::List { port, name }) => {
            commands::list::run(&config, port, name, cli.json).await?;
        }
        Some(Commands::Check { port }) => {
            commands::check::run(&config, port, cli.json).await?;
        }
        Some(Commands::Kill { port }) => {
            commands::kill::run(&config, port, cli.json).await?;
        }
        Some(Commands::Watch) => {
            commands::watch::run(&config, cli.json).await?;
        }
        Some(Commands::Config) => {
            commands::config::show(&store, &config, cli.json)?;
        }
        None => {
            // Default: list ports once
            commands::list::run(&config, None, None, cli.json).await?;
        }
    }

    Ok(())
}
