//! Radio drivers for the BLE peripheral session
//!
//! This crate provides the concrete collaborators that `peripheral-core`
//! drives: radio drivers implementing [`AdvertisingDriver`] and the host
//! [`Platform`] (capability detection, settings launch).
//!
//! ## Platform Support
//!
//! - **Linux**: Full support via `bluer` crate with BlueZ. Central connections
//!   and adapter power changes are reported from BlueZ property signals.
//! - **Other platforms**: [`FallbackAdvertiser`] refuses to start.
//! - **Anywhere**: [`SimulatedRadio`] for dry runs and tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use peripheral_ble::{BleDriverConfig, PlatformAdvertiser, SystemPlatform};
//! use peripheral_core::{AdvertiseData, PeripheralConfig, SessionTask};
//!
//! # async fn example() -> peripheral_core::Result<()> {
//! let config = BleDriverConfig::default();
//! let (session, _task) = SessionTask::spawn(
//!     PlatformAdvertiser::new(config.clone()),
//!     SystemPlatform::new(config),
//!     &PeripheralConfig::default(),
//! );
//! session.start(AdvertiseData::new().with_local_name("Sensor")).await?;
//! # Ok(())
//! # }
//! ```

mod advertising;
mod config;
mod platform;

// Public API exports
pub use advertising::fallback::FallbackAdvertiser;
#[cfg(target_os = "linux")]
pub use advertising::linux::LinuxAdvertiser;
pub use advertising::simulated::{SimulatedAdvertiser, SimulatedRadio};
pub use advertising::PlatformAdvertiser;
pub use config::BleDriverConfig;
pub use platform::SystemPlatform;

// Re-export collaborator traits for convenience
pub use peripheral_core::{AdvertisingDriver, Platform};
