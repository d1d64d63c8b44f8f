//! Host platform services: capability detection and settings launch

use std::process::{Command, Stdio};

use peripheral_core::{PeripheralError, Platform, Result};
use tracing::{debug, info};

use crate::config::BleDriverConfig;

// ----------------------------------------------------------------------------
// System Platform
// ----------------------------------------------------------------------------

/// The machine this process runs on
#[derive(Debug, Clone, Default)]
pub struct SystemPlatform {
    config: BleDriverConfig,
}

impl SystemPlatform {
    pub fn new(config: BleDriverConfig) -> Self {
        Self { config }
    }
}

type SettingsCommand = (&'static str, &'static [&'static str]);

const LINUX_SETTINGS: SettingsCommand = ("gnome-control-center", &["bluetooth"]);
const MACOS_SETTINGS: SettingsCommand = ("open", &["x-apple.systempreferences:com.apple.preferences.Bluetooth"]);
const WINDOWS_SETTINGS: SettingsCommand = ("cmd", &["/C", "start", "ms-settings:bluetooth"]);

/// Command that opens the Bluetooth settings panel
fn settings_command() -> Option<SettingsCommand> {
    if cfg!(target_os = "linux") {
        Some(LINUX_SETTINGS)
    } else if cfg!(target_os = "macos") {
        Some(MACOS_SETTINGS)
    } else if cfg!(target_os = "windows") {
        Some(WINDOWS_SETTINGS)
    } else {
        None
    }
}

#[async_trait::async_trait]
impl Platform for SystemPlatform {
    #[cfg(target_os = "linux")]
    async fn is_peripheral_supported(&self) -> bool {
        let session = match bluer::Session::new().await {
            Ok(session) => session,
            Err(e) => {
                debug!("BlueZ unavailable: {}", e);
                return false;
            }
        };
        let adapter =
            match crate::advertising::linux::open_adapter(&session, self.config.adapter_name.as_deref()).await {
                Ok(adapter) => adapter,
                Err(e) => {
                    debug!("{}", e);
                    return false;
                }
            };
        // LE advertising needs at least one advertising instance.
        match adapter.supported_advertising_instances().await {
            Ok(instances) => instances > 0,
            Err(e) => {
                debug!("Adapter {} has no LE advertising manager: {}", adapter.name(), e);
                false
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    async fn is_peripheral_supported(&self) -> bool {
        let _ = &self.config;
        false
    }

    fn open_bluetooth_settings(&self) -> Result<()> {
        let (program, args) = settings_command()
            .ok_or_else(|| PeripheralError::Settings("no settings panel on this platform".to_string()))?;
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PeripheralError::Settings(format!("{}: {}", program, e)))?;
        info!("Opened Bluetooth settings via {}", program);
        Ok(())
    }
}
