//! Peripheral session configuration

use std::time::Duration;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the peripheral session task
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PeripheralConfig {
    /// Capacity of the host request queue
    pub request_buffer_size: usize,
    /// Maximum time a driver may take to accept a start request
    pub start_timeout: Duration,
    /// Maximum time to wait for the driver to release the radio on stop
    pub stop_timeout: Duration,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            request_buffer_size: 32,
            start_timeout: Duration::from_secs(10),
            stop_timeout: Duration::from_secs(2),
        }
    }
}

impl PeripheralConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set request queue capacity
    pub fn with_request_buffer_size(mut self, size: usize) -> Self {
        self.request_buffer_size = size.max(1);
        self
    }

    /// Set driver start timeout
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Set driver stop timeout
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }
}
