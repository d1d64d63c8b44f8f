//! Simulated radio for dry runs and tests
//!
//! [`SimulatedAdvertiser`] behaves like a real driver: it validates the
//! advertisement, refuses to start when the simulated adapter is off, and
//! confirms starts through [`DriverEvent::Started`]. [`SimulatedRadio`] is the
//! controller side, used to play the part of the outside world (a central
//! connecting, the user switching Bluetooth off).

use std::sync::{Arc, Mutex, MutexGuard};

use peripheral_core::{
    AdvertiseData, AdvertisingDriver, DriverEvent, DriverEventSender, PeripheralError, Platform, Result,
};
use tracing::{debug, info};

#[derive(Debug)]
struct RadioState {
    supported: bool,
    powered: bool,
    broadcasting: bool,
    connected: bool,
    fail_next_start: Option<PeripheralError>,
    last_advertisement: Option<AdvertiseData>,
    start_count: usize,
    stop_count: usize,
    settings_opened: usize,
    events: Option<DriverEventSender>,
}

impl RadioState {
    fn emit(&self, event: DriverEvent) {
        if let Some(events) = &self.events {
            debug!("Simulated radio event {:?}", event);
            let _ = events.send(event);
        }
    }
}

// ----------------------------------------------------------------------------
// Simulated Radio
// ----------------------------------------------------------------------------

/// Controller for a simulated adapter, shared with its [`SimulatedAdvertiser`]
#[derive(Clone, Debug)]
pub struct SimulatedRadio {
    state: Arc<Mutex<RadioState>>,
}

impl SimulatedRadio {
    /// A supported, powered-on adapter
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RadioState {
                supported: true,
                powered: true,
                broadcasting: false,
                connected: false,
                fail_next_start: None,
                last_advertisement: None,
                start_count: 0,
                stop_count: 0,
                settings_opened: 0,
                events: None,
            })),
        }
    }

    /// A machine without BLE peripheral capability
    pub fn unsupported() -> Self {
        let radio = Self::new();
        radio.set_supported(false);
        radio
    }

    fn lock(&self) -> MutexGuard<'_, RadioState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Driver bound to this radio
    pub fn advertiser(&self) -> SimulatedAdvertiser {
        SimulatedAdvertiser { radio: self.clone() }
    }

    pub fn set_supported(&self, supported: bool) {
        self.lock().supported = supported;
    }

    /// Make the next start request fail with `error`
    pub fn fail_next_start(&self, error: PeripheralError) {
        self.lock().fail_next_start = Some(error);
    }

    /// A central connects; ignored unless the radio is broadcasting
    pub fn connect_central(&self) -> bool {
        let mut state = self.lock();
        if !state.broadcasting || state.connected {
            return false;
        }
        state.connected = true;
        state.emit(DriverEvent::CentralConnected);
        true
    }

    /// The connected central goes away; the radio keeps broadcasting
    pub fn disconnect_central(&self) -> bool {
        let mut state = self.lock();
        if !state.connected {
            return false;
        }
        state.connected = false;
        state.emit(DriverEvent::CentralDisconnected);
        true
    }

    /// The radio drops the advertisement on its own
    pub fn lose_advertisement(&self) -> bool {
        let mut state = self.lock();
        if !state.broadcasting {
            return false;
        }
        state.broadcasting = false;
        state.connected = false;
        state.emit(DriverEvent::Stopped);
        true
    }

    /// The user switches Bluetooth off
    pub fn power_off(&self) {
        let mut state = self.lock();
        state.powered = false;
        state.broadcasting = false;
        state.connected = false;
        state.emit(DriverEvent::PoweredOff);
    }

    /// The user switches Bluetooth back on
    pub fn power_on(&self) {
        let mut state = self.lock();
        state.powered = true;
        state.emit(DriverEvent::PoweredOn);
    }

    pub fn is_broadcasting(&self) -> bool {
        self.lock().broadcasting
    }

    pub fn is_powered(&self) -> bool {
        self.lock().powered
    }

    pub fn last_advertisement(&self) -> Option<AdvertiseData> {
        self.lock().last_advertisement.clone()
    }

    pub fn start_count(&self) -> usize {
        self.lock().start_count
    }

    pub fn stop_count(&self) -> usize {
        self.lock().stop_count
    }

    pub fn settings_opened(&self) -> usize {
        self.lock().settings_opened
    }
}

impl Default for SimulatedRadio {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Platform for SimulatedRadio {
    async fn is_peripheral_supported(&self) -> bool {
        self.lock().supported
    }

    fn open_bluetooth_settings(&self) -> Result<()> {
        self.lock().settings_opened += 1;
        info!("Simulated radio: Bluetooth settings opened");
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Simulated Advertiser
// ----------------------------------------------------------------------------

/// Driver half of a [`SimulatedRadio`]
#[derive(Debug)]
pub struct SimulatedAdvertiser {
    radio: SimulatedRadio,
}

#[async_trait::async_trait]
impl AdvertisingDriver for SimulatedAdvertiser {
    fn bind_events(&mut self, events: DriverEventSender) {
        self.radio.lock().events = Some(events);
    }

    async fn start_advertising(&mut self, data: &AdvertiseData) -> Result<()> {
        data.advertised_uuids()?;

        let mut state = self.radio.lock();
        if !state.supported {
            return Err(PeripheralError::UnsupportedPlatform);
        }
        if !state.powered {
            return Err(PeripheralError::AdapterUnavailable("simulated adapter is powered off".to_string()));
        }
        if let Some(error) = state.fail_next_start.take() {
            return Err(error);
        }

        state.start_count += 1;
        state.broadcasting = true;
        state.last_advertisement = Some(data.clone());
        info!("Simulated radio advertising as {:?}", data.local_name);
        state.emit(DriverEvent::Started);
        Ok(())
    }

    async fn stop_advertising(&mut self) -> Result<()> {
        let mut state = self.radio.lock();
        state.stop_count += 1;
        state.broadcasting = false;
        state.connected = false;
        Ok(())
    }
}
