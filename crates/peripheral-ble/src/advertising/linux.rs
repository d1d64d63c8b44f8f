//! Linux BLE advertising implementation using bluer (BlueZ)

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bluer::{AdapterEvent, AdapterProperty, Address, DeviceEvent, DeviceProperty};
use futures::StreamExt;
use peripheral_core::{AdvertiseData, AdvertisingDriver, DriverEvent, DriverEventSender, PeripheralError, Result};
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::BleDriverConfig;

// ----------------------------------------------------------------------------
// Linux Implementation
// ----------------------------------------------------------------------------

pub struct LinuxAdvertiser {
    config: BleDriverConfig,
    session: Option<bluer::Session>,
    adapter: Option<bluer::Adapter>,
    advertisement_handle: Option<bluer::adv::AdvertisementHandle>,
    events: Option<DriverEventSender>,
    link: Arc<LinkState>,
    monitor: Option<JoinHandle<()>>,
}

/// Advertising flag and connected centrals, shared with the adapter monitor
///
/// BlueZ does not say which role a connection was made in. Any device that
/// connects while the advertisement is registered counts as a central, so a
/// link the host opened itself (headphones, for one) also reads as
/// `Connected`.
#[derive(Default)]
struct LinkState {
    advertising: AtomicBool,
    connected: Mutex<HashSet<Address>>,
}

impl LinkState {
    fn set_advertising(&self, advertising: bool) {
        self.advertising.store(advertising, Ordering::SeqCst);
        if !advertising {
            self.connected.lock().unwrap_or_else(|e| e.into_inner()).clear();
        }
    }

    /// Record a connection change, returning the event it implies
    ///
    /// Only the first central in and the last central out are reported, and
    /// only while an advertisement is running.
    fn update(&self, address: Address, is_connected: bool) -> Option<DriverEvent> {
        if !self.advertising.load(Ordering::SeqCst) {
            return None;
        }
        let mut connected = self.connected.lock().unwrap_or_else(|e| e.into_inner());
        if is_connected {
            (connected.insert(address) && connected.len() == 1).then_some(DriverEvent::CentralConnected)
        } else {
            (connected.remove(&address) && connected.is_empty()).then_some(DriverEvent::CentralDisconnected)
        }
    }
}

impl LinuxAdvertiser {
    pub fn new(config: BleDriverConfig) -> Self {
        Self {
            config,
            session: None,
            adapter: None,
            advertisement_handle: None,
            events: None,
            link: Arc::new(LinkState::default()),
            monitor: None,
        }
    }

    async fn initialize(&mut self) -> Result<bluer::Adapter> {
        if let Some(adapter) = &self.adapter {
            return Ok(adapter.clone());
        }

        let session = bluer::Session::new()
            .await
            .map_err(|e| PeripheralError::AdapterUnavailable(format!("BlueZ session: {}", e)))?;
        let adapter = open_adapter(&session, self.config.adapter_name.as_deref()).await?;

        if let Some(events) = &self.events {
            self.monitor = Some(tokio::spawn(monitor_adapter(
                adapter.clone(),
                events.clone(),
                self.link.clone(),
            )));
        }

        info!("Linux BLE adapter {} initialized for advertising", adapter.name());
        self.session = Some(session);
        self.adapter = Some(adapter.clone());
        Ok(adapter)
    }

    /// Drop the running advertisement outside of a stop request
    fn release_advertisement(&mut self) {
        self.link.set_advertising(false);
        if self.advertisement_handle.take().is_some() {
            info!("BLE advertisement released");
            if let Some(events) = &self.events {
                let _ = events.send(DriverEvent::Stopped);
            }
        }
    }
}

fn advertise_error(e: bluer::Error) -> PeripheralError {
    match e.kind {
        bluer::ErrorKind::NotAuthorized
        | bluer::ErrorKind::NotPermitted
        | bluer::ErrorKind::NotReady
        | bluer::ErrorKind::NotAvailable => PeripheralError::AdapterUnavailable(e.to_string()),
        _ => PeripheralError::Driver(format!("Failed to start advertising: {}", e)),
    }
}

/// Open the configured adapter, or the default one
pub(crate) async fn open_adapter(session: &bluer::Session, name: Option<&str>) -> Result<bluer::Adapter> {
    let adapter = match name {
        Some(name) => session.adapter(name),
        None => session.default_adapter().await,
    };
    adapter.map_err(|e| PeripheralError::AdapterUnavailable(format!("BLE adapter: {}", e)))
}

#[async_trait::async_trait]
impl AdvertisingDriver for LinuxAdvertiser {
    fn bind_events(&mut self, events: DriverEventSender) {
        self.events = Some(events);
    }

    async fn start_advertising(&mut self, data: &AdvertiseData) -> Result<()> {
        let service_uuids = data.advertised_uuids()?;
        let adapter = self.initialize().await?;

        // The adapter is the user's to switch on; never force it.
        let powered = adapter
            .is_powered()
            .await
            .map_err(|e| PeripheralError::AdapterUnavailable(e.to_string()))?;
        if !powered {
            return Err(PeripheralError::AdapterUnavailable(format!(
                "adapter {} is powered off",
                adapter.name()
            )));
        }

        let discoverable = self.config.discoverable;
        let advertisement = || bluer::adv::Advertisement {
            advertisement_type: bluer::adv::Type::Peripheral,
            local_name: data.local_name.clone(),
            service_uuids: service_uuids.iter().copied().collect(),
            discoverable: Some(discoverable),
            ..Default::default()
        };

        // Register the replacement before releasing the running advertisement.
        let handle = match adapter.advertise(advertisement()).await {
            Ok(handle) => handle,
            Err(e) if self.advertisement_handle.is_some() => {
                debug!("Replacement advertisement rejected ({}), releasing the running one", e);
                self.release_advertisement();
                adapter.advertise(advertisement()).await.map_err(advertise_error)?
            }
            Err(e) => return Err(advertise_error(e)),
        };

        if self.advertisement_handle.replace(handle).is_some() {
            debug!("Replaced running advertisement");
        }
        self.link.set_advertising(true);
        info!("Started BLE advertising as {:?}", data.local_name);

        if let Some(events) = &self.events {
            let _ = events.send(DriverEvent::Started);
        }
        Ok(())
    }

    async fn stop_advertising(&mut self) -> Result<()> {
        self.link.set_advertising(false);
        if let Some(handle) = self.advertisement_handle.take() {
            drop(handle); // Dropping the handle unregisters the advertisement
            info!("Stopped BLE advertising");
        }
        Ok(())
    }
}

impl Drop for LinuxAdvertiser {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.abort();
        }
    }
}

// ----------------------------------------------------------------------------
// Adapter Monitor
// ----------------------------------------------------------------------------

/// Translate BlueZ adapter and device events into driver events
///
/// Device watchers live in a [`DeviceWatchers`] owned by this task, so
/// aborting the monitor also ends every watcher.
async fn monitor_adapter(adapter: bluer::Adapter, events: DriverEventSender, link: Arc<LinkState>) {
    let mut adapter_events = match adapter.events().await {
        Ok(stream) => Box::pin(stream),
        Err(e) => {
            warn!("Unable to watch adapter {}: {}", adapter.name(), e);
            return;
        }
    };

    let mut watchers = DeviceWatchers::default();
    if let Ok(addresses) = adapter.device_addresses().await {
        for address in addresses {
            watch_device(&mut watchers, &adapter, address, &events, &link);
        }
    }

    loop {
        tokio::select! {
            event = adapter_events.next() => {
                let Some(event) = event else { break };
                match event {
                    AdapterEvent::PropertyChanged(AdapterProperty::Powered(powered)) => {
                        info!("Adapter {} powered {}", adapter.name(), if powered { "on" } else { "off" });
                        let event = if powered {
                            DriverEvent::PoweredOn
                        } else {
                            link.set_advertising(false);
                            DriverEvent::PoweredOff
                        };
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    AdapterEvent::DeviceAdded(address) => {
                        watch_device(&mut watchers, &adapter, address, &events, &link);
                    }
                    AdapterEvent::DeviceRemoved(address) => {
                        watchers.forget(&address);
                        if let Some(event) = link.update(address, false) {
                            if events.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    _ => {}
                }
            }
            Some(_) = watchers.tasks.join_next() => watchers.reap(),
        }
    }

    debug!("Adapter event stream for {} ended", adapter.name());
}

fn watch_device(
    watchers: &mut DeviceWatchers,
    adapter: &bluer::Adapter,
    address: Address,
    events: &DriverEventSender,
    link: &Arc<LinkState>,
) {
    if watchers.is_watching(&address) {
        return;
    }
    let device = match adapter.device(address) {
        Ok(device) => device,
        Err(e) => {
            debug!("Cannot watch device {}: {}", address, e);
            return;
        }
    };
    let events = events.clone();
    let link = link.clone();

    watchers.watch(address, async move {
        let mut device_events = match device.events().await {
            Ok(stream) => Box::pin(stream),
            Err(_) => return,
        };
        while let Some(event) = device_events.next().await {
            let DeviceEvent::PropertyChanged(DeviceProperty::Connected(is_connected)) = event else {
                continue;
            };
            if let Some(event) = link.update(address, is_connected) {
                debug!("Central {} {:?}", address, event);
                if events.send(event).is_err() {
                    break;
                }
            }
        }
    });
}

// ----------------------------------------------------------------------------
// Device Watchers
// ----------------------------------------------------------------------------

/// At most one connection watcher per device address
///
/// Dropping the set aborts every watcher still running.
#[derive(Default)]
struct DeviceWatchers {
    tasks: JoinSet<()>,
    by_address: HashMap<Address, AbortHandle>,
}

impl DeviceWatchers {
    fn is_watching(&self, address: &Address) -> bool {
        self.by_address.get(address).is_some_and(|handle| !handle.is_finished())
    }

    /// Spawn `watcher` for `address` unless one is already running
    fn watch<F>(&mut self, address: Address, watcher: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_watching(&address) {
            return false;
        }
        let handle = self.tasks.spawn(watcher);
        self.by_address.insert(address, handle);
        true
    }

    /// Abort the watcher for a device BlueZ no longer knows about
    fn forget(&mut self, address: &Address) {
        if let Some(handle) = self.by_address.remove(address) {
            handle.abort();
        }
    }

    fn reap(&mut self) {
        self.by_address.retain(|_, handle| !handle.is_finished());
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.by_address.len()
    }
}
