//! Platform radio drivers and platform detection

pub mod fallback;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod simulated;

use peripheral_core::{AdvertiseData, AdvertisingDriver, DriverEventSender, Result};

use crate::config::BleDriverConfig;

// ----------------------------------------------------------------------------
// Platform Detection and Factory
// ----------------------------------------------------------------------------

/// Platform-specific advertiser enum
pub enum PlatformAdvertiser {
    #[cfg(target_os = "linux")]
    Linux(linux::LinuxAdvertiser),
    #[allow(dead_code)]
    Fallback(fallback::FallbackAdvertiser),
}

impl PlatformAdvertiser {
    /// Create the appropriate advertiser for the current platform
    pub fn new(config: BleDriverConfig) -> Self {
        #[cfg(target_os = "linux")]
        {
            Self::Linux(linux::LinuxAdvertiser::new(config))
        }
        #[cfg(not(target_os = "linux"))]
        {
            let _ = config;
            Self::Fallback(fallback::FallbackAdvertiser::new())
        }
    }
}

impl Default for PlatformAdvertiser {
    fn default() -> Self {
        Self::new(BleDriverConfig::default())
    }
}

#[async_trait::async_trait]
impl AdvertisingDriver for PlatformAdvertiser {
    fn bind_events(&mut self, events: DriverEventSender) {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut advertiser) => advertiser.bind_events(events),
            Self::Fallback(ref mut advertiser) => advertiser.bind_events(events),
        }
    }

    async fn start_advertising(&mut self, data: &AdvertiseData) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut advertiser) => advertiser.start_advertising(data).await,
            Self::Fallback(ref mut advertiser) => advertiser.start_advertising(data).await,
        }
    }

    async fn stop_advertising(&mut self) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Self::Linux(ref mut advertiser) => advertiser.stop_advertising().await,
            Self::Fallback(ref mut advertiser) => advertiser.stop_advertising().await,
        }
    }
}
