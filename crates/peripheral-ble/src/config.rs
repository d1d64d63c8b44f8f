//! BLE driver configuration

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the platform radio driver
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BleDriverConfig {
    /// Adapter to advertise on (e.g. `hci1`); the default adapter when unset
    pub adapter_name: Option<String>,
    /// Whether the advertisement sets the general discoverable flag
    pub discoverable: bool,
}

impl Default for BleDriverConfig {
    fn default() -> Self {
        Self {
            adapter_name: None,
            discoverable: true,
        }
    }
}

impl BleDriverConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise on a specific adapter
    pub fn with_adapter_name(mut self, name: impl Into<String>) -> Self {
        self.adapter_name = Some(name.into());
        self
    }

    /// Enable or disable the discoverable flag
    pub fn with_discoverable(mut self, discoverable: bool) -> Self {
        self.discoverable = discoverable;
        self
    }
}
