use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather dashboard for the terminal and the browser.")]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "WEATHERDASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the dashboard once
    Show(ShowArgs),
    /// Serve the dashboard as a JSON API
    Serve {
        #[arg(short, long, env = "WEATHERDASH_PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Show or change the stored display name
    User {
        name: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Look up a city instead of using the device position
    #[arg(long, conflicts_with = "device")]
    pub city: Option<String>,

    /// Use the device position (the default when no city is given)
    #[arg(long)]
    pub device: bool,

    /// Print the view model as JSON
    #[arg(long)]
    pub json: bool,
}
