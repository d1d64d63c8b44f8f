//! blepd - advertise this machine as a BLE peripheral

use clap::Parser;
use tracing::{error, info};

use peripheral_cli::{app::PeripheralApp, cli::Cli, commands::CommandDispatcher, config::AppConfig, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = load_configuration(&cli)?;

    // Initialize logging
    setup_logging(cli.verbose || config.cli.verbose);

    let app = PeripheralApp::new(&config, cli.simulate);

    // Execute the command
    if let Err(e) = CommandDispatcher::execute(cli.command, app).await {
        error!("Command execution failed: {}", e);
        std::process::exit(1);
    }

    info!("blepd exited successfully");
    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(config_path) => AppConfig::load_from_file(config_path),
        None => Ok(AppConfig::default()),
    }
}
