//! Fallback advertising implementation for unsupported platforms

use peripheral_core::{AdvertiseData, AdvertisingDriver, DriverEventSender, PeripheralError, Result};
use tracing::warn;

// ----------------------------------------------------------------------------
// Fallback Implementation
// ----------------------------------------------------------------------------

/// Driver for platforms without BLE peripheral support
///
/// Every start is refused with [`PeripheralError::UnsupportedPlatform`].
#[derive(Debug, Default)]
pub struct FallbackAdvertiser;

impl FallbackAdvertiser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl AdvertisingDriver for FallbackAdvertiser {
    fn bind_events(&mut self, _events: DriverEventSender) {}

    async fn start_advertising(&mut self, data: &AdvertiseData) -> Result<()> {
        warn!(
            "BLE advertising not supported on this platform. Device {:?} will not be discoverable. \
            Consider using a supported platform (Linux with BlueZ) for full functionality.",
            data.local_name
        );
        Err(PeripheralError::UnsupportedPlatform)
    }

    async fn stop_advertising(&mut self) -> Result<()> {
        Ok(())
    }
}
