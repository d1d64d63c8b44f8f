//! Collaborator traits for the radio driver and the host platform

use tokio::sync::mpsc;

use crate::data::AdvertiseData;
use crate::error::Result;

// ----------------------------------------------------------------------------
// Driver Events
// ----------------------------------------------------------------------------

/// Low-level event reported asynchronously by a radio driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverEvent {
    /// The radio confirmed advertising has begun
    Started,
    /// The radio stopped broadcasting without a stop request
    Stopped,
    /// A central connected to this peripheral
    CentralConnected,
    /// The connected central went away
    CentralDisconnected,
    /// The adapter was switched off
    PoweredOff,
    /// The adapter was switched back on
    PoweredOn,
}

pub type DriverEventSender = mpsc::UnboundedSender<DriverEvent>;
pub type DriverEventReceiver = mpsc::UnboundedReceiver<DriverEvent>;

/// Create the channel a driver reports its events on
pub fn driver_event_channel() -> (DriverEventSender, DriverEventReceiver) {
    mpsc::unbounded_channel()
}

// ----------------------------------------------------------------------------
// Radio Driver
// ----------------------------------------------------------------------------

/// Radio driver that broadcasts the peripheral advertisement
///
/// Only the session manager holds a driver. Results of `start_advertising`
/// only say whether the request was accepted; confirmation arrives later as
/// [`DriverEvent::Started`] on the bound event sender.
#[async_trait::async_trait]
pub trait AdvertisingDriver: Send {
    /// Hand the driver the sender it reports [`DriverEvent`]s on
    fn bind_events(&mut self, events: DriverEventSender);

    /// Configure and start advertising, replacing any running advertisement
    async fn start_advertising(&mut self, data: &AdvertiseData) -> Result<()>;

    /// Stop advertising; stopping an idle driver is not an error
    async fn stop_advertising(&mut self) -> Result<()>;
}

#[async_trait::async_trait]
impl<D: AdvertisingDriver + ?Sized> AdvertisingDriver for Box<D> {
    fn bind_events(&mut self, events: DriverEventSender) {
        (**self).bind_events(events)
    }

    async fn start_advertising(&mut self, data: &AdvertiseData) -> Result<()> {
        (**self).start_advertising(data).await
    }

    async fn stop_advertising(&mut self) -> Result<()> {
        (**self).stop_advertising().await
    }
}

// ----------------------------------------------------------------------------
// Platform
// ----------------------------------------------------------------------------

/// Host platform services outside the radio itself
#[async_trait::async_trait]
pub trait Platform: Send + Sync {
    /// Whether this machine can act as a BLE peripheral at all
    async fn is_peripheral_supported(&self) -> bool;

    /// Open the operating system's Bluetooth settings
    fn open_bluetooth_settings(&self) -> Result<()>;
}

#[async_trait::async_trait]
impl<P: Platform + ?Sized> Platform for Box<P> {
    async fn is_peripheral_supported(&self) -> bool {
        (**self).is_peripheral_supported().await
    }

    fn open_bluetooth_settings(&self) -> Result<()> {
        (**self).open_bluetooth_settings()
    }
}
