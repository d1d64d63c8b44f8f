//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use a simulated radio instead of the system adapter
    #[arg(long)]
    pub simulate: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Advertise until interrupted, printing every state change
    Advertise {
        /// Advertised device name
        #[arg(short, long)]
        name: Option<String>,
        /// Primary service UUID
        #[arg(short, long)]
        service_uuid: Option<String>,
        /// Additional service UUID (repeatable)
        #[arg(short, long = "uuid")]
        uuids: Vec<String>,
    },
    /// Show platform support and current state
    Status,
    /// Open the system Bluetooth settings
    Settings,
    /// Read method calls from stdin (for testing/automation)
    Interactive,
}
