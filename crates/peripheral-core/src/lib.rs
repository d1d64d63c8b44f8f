//! Advertising session core for a BLE peripheral
//!
//! This crate holds the part of the peripheral role that has to stay
//! consistent with asynchronously changing radio state: the advertising state
//! machine and the single-subscriber channel that relays every state change
//! to the host.
//!
//! ## Architecture
//!
//! - [`state`] - The four-valued [`AdvertisingState`]
//! - [`channel`] - [`StateChannel`], current state plus one replaying subscriber
//! - [`data`] - [`AdvertiseData`], the per-start advertisement configuration
//! - [`driver`] - Collaborator traits for the radio driver and host platform
//! - [`session`] - [`SessionManager`], the state machine driving the radio
//! - [`task`] - [`SessionTask`] and [`SessionHandle`], the serializing owner
//! - [`command`] - Typed host commands and method-call parsing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use peripheral_core::{AdvertiseData, PeripheralConfig, SessionTask};
//!
//! let (handle, _task) = SessionTask::spawn(driver, platform, &PeripheralConfig::default());
//! let mut states = handle.subscribe_stream();
//! handle.start(AdvertiseData::new().with_local_name("Sensor")).await?;
//! while let Some(state) = states.recv().await {
//!     println!("{}", state);
//! }
//! ```

pub mod channel;
pub mod command;
pub mod config;
pub mod data;
pub mod driver;
pub mod error;
pub mod service_uuid;
pub mod session;
pub mod state;
pub mod task;

// Public API exports
pub use channel::{StateChannel, StateReceiver, Subscriber};
pub use command::{CommandReply, HostCommand};
pub use config::PeripheralConfig;
pub use data::AdvertiseData;
pub use driver::{
    driver_event_channel, AdvertisingDriver, DriverEvent, DriverEventReceiver, DriverEventSender,
    Platform,
};
pub use error::{PeripheralError, Result};
pub use service_uuid::{parse_service_uuid, uuid_from_short, BLUETOOTH_BASE_UUID};
pub use session::SessionManager;
pub use state::AdvertisingState;
pub use task::{SessionHandle, SessionTask};
