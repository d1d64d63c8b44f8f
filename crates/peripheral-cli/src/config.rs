//! Peripheral CLI configuration
//!
//! Configuration is read from a TOML file when `--config` is given and falls
//! back to defaults otherwise. Every section and field is optional.
//!
//! ```toml
//! [peripheral]
//! request_buffer_size = 32
//! start_timeout = { secs = 10, nanos = 0 }
//! stop_timeout = { secs = 2, nanos = 0 }
//!
//! [ble]
//! adapter_name = "hci0"
//! discoverable = true
//!
//! [cli]
//! verbose = false
//! ```

use std::path::Path;

use peripheral_ble::BleDriverConfig;
use peripheral_core::PeripheralConfig;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// CLI Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the peripheral CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Session task configuration
    pub peripheral: PeripheralConfig,
    /// Radio driver configuration
    pub ble: BleDriverConfig,
    /// CLI-specific configuration
    pub cli: CliConfig,
}

/// CLI-specific configuration options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Enable verbose logging output
    pub verbose: bool,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
