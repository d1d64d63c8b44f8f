//! Application wiring: picks the radio and spawns the session task

use peripheral_ble::{PlatformAdvertiser, SimulatedRadio, SystemPlatform};
use peripheral_core::{AdvertisingDriver, Platform, SessionHandle, SessionTask};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::Result;

/// A running peripheral session and the radio behind it
pub struct PeripheralApp {
    session: SessionHandle,
    task: JoinHandle<()>,
    radio: Option<SimulatedRadio>,
}

impl PeripheralApp {
    /// Spawn the session on the system adapter, or on a simulated one
    pub fn new(config: &AppConfig, simulate: bool) -> Self {
        let driver: Box<dyn AdvertisingDriver>;
        let platform: Box<dyn Platform>;
        let radio = if simulate {
            info!("Using simulated radio");
            let radio = SimulatedRadio::new();
            driver = Box::new(radio.advertiser());
            platform = Box::new(radio.clone());
            Some(radio)
        } else {
            driver = Box::new(PlatformAdvertiser::new(config.ble.clone()));
            platform = Box::new(SystemPlatform::new(config.ble.clone()));
            None
        };

        let (session, task) = SessionTask::spawn(driver, platform, &config.peripheral);
        Self { session, task, radio }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// The simulated radio, when running with `--simulate`
    pub fn radio(&self) -> Option<&SimulatedRadio> {
        self.radio.as_ref()
    }

    /// Stop advertising and wait for the session task to end
    pub async fn shutdown(self) -> Result<()> {
        self.session.shutdown().await?;
        if let Err(e) = self.task.await {
            warn!("Session task ended abnormally: {}", e);
        }
        Ok(())
    }
}
