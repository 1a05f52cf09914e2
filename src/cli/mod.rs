pub mod components;
pub mod config;
pub mod devices;
pub mod monitor;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use components::handle_components;
use config::handle_config;
use devices::handle_devices;
use monitor::{handle_monitor, MonitorCommand};

use steampad::config::{path::get_config_path, SessionConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Load the session configuration from this YAML file instead of the
    /// default search path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List connected Steam Controller interfaces (default)
    Devices,
    /// Show the buttons and axes exposed with the effective configuration
    Components,
    /// Print the effective configuration as YAML
    Config,
    /// Open every discovered controller and print its input events
    Monitor(MonitorCommand),
}

pub async fn main_cli(args: Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config)?;

    match args.cmd.unwrap_or(Commands::Devices) {
        Commands::Devices => handle_devices()?,
        Commands::Components => handle_components(&config)?,
        Commands::Config => handle_config(&config)?,
        Commands::Monitor(cmd) => handle_monitor(config, cmd).await?,
    }

    Ok(())
}

/// Load the configuration from the given path, or from the default search
/// path. A missing default configuration file means defaults.
fn load_config(path: Option<PathBuf>) -> Result<SessionConfig, Box<dyn Error>> {
    if let Some(path) = path {
        log::debug!("Loading configuration from {path:?}");
        return Ok(SessionConfig::from_yaml_file(path)?);
    }

    let path = get_config_path();
    if !path.exists() {
        log::debug!("No configuration at {path:?}, using defaults");
        return Ok(SessionConfig::default());
    }
    log::debug!("Loading configuration from {path:?}");
    Ok(SessionConfig::from_yaml_file(path)?)
}
