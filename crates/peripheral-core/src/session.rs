//! Advertising session manager
//!
//! Translates host commands into radio driver calls and driver events into
//! [`StateChannel`] updates. The manager never rejects a driver event: the
//! radio is the ground truth, so every reported event is published as-is.
//!
//! ```text
//! Idle        --(driver confirms start)--> Advertising
//! Advertising --(central connects)-------> Connected
//! Connected   --(central disconnects)----> Advertising
//! Advertising --(stop)-------------------> Idle
//! Connected   --(stop)-------------------> Idle
//! any         --(adapter powered off)----> PoweredOff
//! PoweredOff  --(adapter powered on)-----> Idle
//! Advertising --(radio lost broadcast)----> Idle
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::channel::StateChannel;
use crate::command::{CommandReply, HostCommand};
use crate::config::PeripheralConfig;
use crate::data::AdvertiseData;
use crate::driver::{driver_event_channel, AdvertisingDriver, DriverEvent, DriverEventReceiver, Platform};
use crate::error::{PeripheralError, Result};
use crate::state::AdvertisingState;

// ----------------------------------------------------------------------------
// Session Manager
// ----------------------------------------------------------------------------

/// Owner of the radio driver for one peripheral
pub struct SessionManager<D, P> {
    driver: D,
    platform: P,
    channel: StateChannel,
    start_timeout: Duration,
    stop_timeout: Duration,
}

impl<D: AdvertisingDriver, P: Platform> SessionManager<D, P> {
    /// Create a manager and bind `driver` to a fresh event channel
    ///
    /// The returned receiver carries the driver's events; feed them back
    /// through [`SessionManager::handle_driver_event`].
    pub fn new(mut driver: D, platform: P, channel: StateChannel) -> (Self, DriverEventReceiver) {
        let (events_tx, events_rx) = driver_event_channel();
        driver.bind_events(events_tx);
        let defaults = PeripheralConfig::default();
        let manager = Self {
            driver,
            platform,
            channel,
            start_timeout: defaults.start_timeout,
            stop_timeout: defaults.stop_timeout,
        };
        (manager, events_rx)
    }

    pub fn with_config(mut self, config: &PeripheralConfig) -> Self {
        self.start_timeout = config.start_timeout;
        self.stop_timeout = config.stop_timeout;
        self
    }

    pub fn channel(&self) -> &StateChannel {
        &self.channel
    }

    /// Configure and start the driver
    ///
    /// Success means the driver accepted the request. The state only moves to
    /// [`AdvertisingState::Advertising`] once the driver reports
    /// [`DriverEvent::Started`]; on failure the state is left untouched. The
    /// capability check and the driver call share `start_timeout`.
    pub async fn start(&mut self, data: AdvertiseData) -> Result<()> {
        let platform = &self.platform;
        let driver = &mut self.driver;
        let attempt = async {
            if !platform.is_peripheral_supported().await {
                warn!("Refusing to advertise: platform cannot act as a BLE peripheral");
                return Err(PeripheralError::UnsupportedPlatform);
            }
            driver.start_advertising(&data).await
        };

        match tokio::time::timeout(self.start_timeout, attempt).await {
            Ok(Ok(())) => {
                info!(
                    "Advertising requested (name: {:?}, service: {:?}, extra services: {})",
                    data.local_name,
                    data.service_uuid,
                    data.service_uuids.as_ref().map_or(0, Vec::len)
                );
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Failed to start advertising: {}", e);
                Err(e)
            }
            Err(_) => {
                warn!("Driver did not accept start within {:?}", self.start_timeout);
                Err(PeripheralError::AdapterUnavailable(format!(
                    "start timed out after {:?}",
                    self.start_timeout
                )))
            }
        }
    }

    /// Stop advertising and publish [`AdvertisingState::Idle`]
    ///
    /// Always succeeds from the host's point of view. A driver that fails or
    /// does not release the radio within `stop_timeout` is logged and `Idle`
    /// is published anyway.
    pub async fn stop(&mut self) {
        match tokio::time::timeout(self.stop_timeout, self.driver.stop_advertising()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Driver failed to stop advertising: {}", e),
            Err(_) => warn!("Driver did not stop within {:?}", self.stop_timeout),
        }
        self.channel.publish(AdvertisingState::Idle);
        info!("Advertising stopped");
    }

    pub fn is_advertising(&self) -> bool {
        self.channel.current() == AdvertisingState::Advertising
    }

    pub fn is_connected(&self) -> bool {
        self.channel.current() == AdvertisingState::Connected
    }

    /// Ask the platform for peripheral capability, bounded by `start_timeout`
    ///
    /// The returned future borrows only the platform, so it stays `Send` for
    /// drivers that are not `Sync`.
    pub fn is_supported(&self) -> impl Future<Output = bool> + Send + '_ {
        supported_within(&self.platform, self.start_timeout)
    }

    pub fn open_bluetooth_settings(&self) -> Result<()> {
        self.platform.open_bluetooth_settings()
    }

    /// Publish the state a driver event implies and return it
    pub fn handle_driver_event(&self, event: DriverEvent) -> AdvertisingState {
        let state = match event {
            DriverEvent::Started => AdvertisingState::Advertising,
            DriverEvent::Stopped => AdvertisingState::Idle,
            DriverEvent::CentralConnected => AdvertisingState::Connected,
            // The driver keeps broadcasting after a central leaves.
            DriverEvent::CentralDisconnected => AdvertisingState::Advertising,
            DriverEvent::PoweredOff => AdvertisingState::PoweredOff,
            DriverEvent::PoweredOn => AdvertisingState::Idle,
        };
        debug!("Driver event {:?}", event);
        self.channel.publish(state);
        state
    }

    /// Run a typed host command
    pub async fn execute(&mut self, command: HostCommand) -> Result<CommandReply> {
        match command {
            HostCommand::Start(data) => self.start(data).await.map(|_| CommandReply::Done),
            HostCommand::Stop => {
                self.stop().await;
                Ok(CommandReply::Done)
            }
            HostCommand::IsAdvertising => Ok(CommandReply::Bool(self.is_advertising())),
            HostCommand::IsConnected => Ok(CommandReply::Bool(self.is_connected())),
            HostCommand::IsSupported => {
                let supported = supported_within(&self.platform, self.start_timeout).await;
                Ok(CommandReply::Bool(supported))
            }
            HostCommand::OpenBluetoothSettings => {
                self.open_bluetooth_settings().map(|_| CommandReply::Done)
            }
        }
    }
}

async fn supported_within<P: Platform>(platform: &P, limit: Duration) -> bool {
    match tokio::time::timeout(limit, platform.is_peripheral_supported()).await {
        Ok(supported) => supported,
        Err(_) => {
            warn!("Platform capability check did not answer within {:?}", limit);
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::driver::DriverEventSender;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    pub(crate) struct DriverLog {
        pub starts: Vec<AdvertiseData>,
        pub stops: usize,
    }

    /// Driver that records calls and confirms starts immediately
    pub(crate) struct RecordingDriver {
        pub events: Option<DriverEventSender>,
        pub log: Arc<Mutex<DriverLog>>,
        pub fail_start: Option<PeripheralError>,
        pub fail_stop: bool,
        pub hang_start: bool,
        pub hang_stop: bool,
    }

    impl RecordingDriver {
        pub fn new() -> (Self, Arc<Mutex<DriverLog>>) {
            let log = Arc::new(Mutex::new(DriverLog::default()));
            let driver = Self {
                events: None,
                log: log.clone(),
                fail_start: None,
                fail_stop: false,
                hang_start: false,
                hang_stop: false,
            };
            (driver, log)
        }
    }

    #[async_trait::async_trait]
    impl AdvertisingDriver for RecordingDriver {
        fn bind_events(&mut self, events: DriverEventSender) {
            self.events = Some(events);
        }

        async fn start_advertising(&mut self, data: &AdvertiseData) -> Result<()> {
            if self.hang_start {
                std::future::pending::<()>().await;
            }
            if let Some(err) = self.fail_start.clone() {
                return Err(err);
            }
            self.log.lock().unwrap().starts.push(data.clone());
            if let Some(events) = &self.events {
                let _ = events.send(DriverEvent::Started);
            }
            Ok(())
        }

        async fn stop_advertising(&mut self) -> Result<()> {
            self.log.lock().unwrap().stops += 1;
            if self.hang_stop {
                std::future::pending::<()>().await;
            }
            if self.fail_stop {
                return Err(PeripheralError::Driver("stop failed".to_string()));
            }
            Ok(())
        }
    }

    pub(crate) struct StaticPlatform {
        pub supported: bool,
    }

    #[async_trait::async_trait]
    impl Platform for StaticPlatform {
        async fn is_peripheral_supported(&self) -> bool {
            self.supported
        }

        fn open_bluetooth_settings(&self) -> Result<()> {
            Ok(())
        }
    }

    /// Platform whose capability check never answers
    struct StallingPlatform;

    #[async_trait::async_trait]
    impl Platform for StallingPlatform {
        async fn is_peripheral_supported(&self) -> bool {
            std::future::pending::<bool>().await
        }

        fn open_bluetooth_settings(&self) -> Result<()> {
            Ok(())
        }
    }

    fn manager(
        driver: RecordingDriver,
        supported: bool,
    ) -> (SessionManager<RecordingDriver, StaticPlatform>, DriverEventReceiver) {
        SessionManager::new(driver, StaticPlatform { supported }, StateChannel::new())
    }

    #[tokio::test]
    async fn test_start_waits_for_driver_confirmation() {
        let (driver, log) = RecordingDriver::new();
        let (mut manager, mut events) = manager(driver, true);
        let mut stream = manager.channel().subscribe_stream();
        assert_eq!(stream.recv().await, Some(AdvertisingState::Idle));

        let data = AdvertiseData::new().with_local_name("Peripheral");
        manager.start(data.clone()).await.unwrap();

        // Accepted, but not yet confirmed
        assert_eq!(manager.channel().current(), AdvertisingState::Idle);
        assert_eq!(log.lock().unwrap().starts, vec![data]);

        let event = events.recv().await.unwrap();
        assert_eq!(event, DriverEvent::Started);
        manager.handle_driver_event(event);

        assert!(manager.is_advertising());
        assert_eq!(stream.recv().await, Some(AdvertisingState::Advertising));
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_falls_back_to_advertising() {
        let (driver, _log) = RecordingDriver::new();
        let (manager, _events) = manager(driver, true);

        manager.handle_driver_event(DriverEvent::Started);
        assert_eq!(manager.handle_driver_event(DriverEvent::CentralConnected), AdvertisingState::Connected);
        assert!(manager.is_connected());
        assert_eq!(
            manager.handle_driver_event(DriverEvent::CentralDisconnected),
            AdvertisingState::Advertising
        );
    }

    #[tokio::test]
    async fn test_stop_while_connected_publishes_idle() {
        let (mut driver, log) = RecordingDriver::new();
        driver.fail_stop = true;
        let (mut manager, _events) = manager(driver, true);

        manager.handle_driver_event(DriverEvent::Started);
        manager.handle_driver_event(DriverEvent::CentralConnected);
        manager.stop().await;

        assert_eq!(manager.channel().current(), AdvertisingState::Idle);
        assert_eq!(log.lock().unwrap().stops, 1);
    }

    #[tokio::test]
    async fn test_unsupported_platform_rejects_start() {
        let (driver, log) = RecordingDriver::new();
        let (mut manager, _events) = manager(driver, false);

        assert!(!manager.is_supported().await);
        let err = manager.start(AdvertiseData::new()).await.unwrap_err();

        assert_eq!(err, PeripheralError::UnsupportedPlatform);
        assert_eq!(manager.channel().current(), AdvertisingState::Idle);
        assert!(log.lock().unwrap().starts.is_empty());
    }

    #[tokio::test]
    async fn test_driver_failure_leaves_state_untouched() {
        let (mut driver, _log) = RecordingDriver::new();
        driver.fail_start = Some(PeripheralError::AdapterUnavailable("powered off".to_string()));
        let (mut manager, _events) = manager(driver, true);

        let err = manager.start(AdvertiseData::new()).await.unwrap_err();
        assert!(matches!(err, PeripheralError::AdapterUnavailable(_)));
        assert_eq!(manager.channel().current(), AdvertisingState::Idle);
    }

    #[tokio::test]
    async fn test_start_timeout_reports_adapter_unavailable() {
        let (mut driver, _log) = RecordingDriver::new();
        driver.hang_start = true;
        let (manager, _events) = manager(driver, true);
        let config = PeripheralConfig::new().with_start_timeout(Duration::from_millis(50));
        let mut manager = manager.with_config(&config);

        let err = manager.start(AdvertiseData::new()).await.unwrap_err();
        assert!(matches!(err, PeripheralError::AdapterUnavailable(_)));
        assert_eq!(manager.channel().current(), AdvertisingState::Idle);
    }

    #[tokio::test]
    async fn test_power_cycle() {
        let (driver, _log) = RecordingDriver::new();
        let (manager, _events) = manager(driver, true);

        manager.handle_driver_event(DriverEvent::CentralConnected);
        assert_eq!(manager.handle_driver_event(DriverEvent::PoweredOff), AdvertisingState::PoweredOff);
        assert_eq!(manager.handle_driver_event(DriverEvent::PoweredOn), AdvertisingState::Idle);
    }

    #[tokio::test]
    async fn test_execute_queries() {
        let (driver, _log) = RecordingDriver::new();
        let (mut manager, _events) = manager(driver, true);
        manager.handle_driver_event(DriverEvent::Started);

        assert_eq!(manager.execute(HostCommand::IsAdvertising).await, Ok(CommandReply::Bool(true)));
        assert_eq!(manager.execute(HostCommand::IsConnected).await, Ok(CommandReply::Bool(false)));
        assert_eq!(manager.execute(HostCommand::IsSupported).await, Ok(CommandReply::Bool(true)));
        assert_eq!(
            manager.execute(HostCommand::OpenBluetoothSettings).await,
            Ok(CommandReply::Done)
        );
        assert_eq!(manager.execute(HostCommand::Stop).await, Ok(CommandReply::Done));
        assert_eq!(manager.execute(HostCommand::IsAdvertising).await, Ok(CommandReply::Bool(false)));
    }

    #[tokio::test]
    async fn test_hung_driver_stop_still_publishes_idle() {
        let (mut driver, log) = RecordingDriver::new();
        driver.hang_stop = true;
        let (manager, _events) = manager(driver, true);
        let config = PeripheralConfig::new().with_stop_timeout(Duration::from_millis(50));
        let mut manager = manager.with_config(&config);

        manager.handle_driver_event(DriverEvent::Started);
        manager.handle_driver_event(DriverEvent::CentralConnected);

        let stopped = tokio::time::timeout(Duration::from_secs(2), manager.stop()).await;
        assert!(stopped.is_ok());
        assert_eq!(manager.channel().current(), AdvertisingState::Idle);
        assert_eq!(log.lock().unwrap().stops, 1);
    }

    #[tokio::test]
    async fn test_stalled_capability_check_is_bounded() {
        let (driver, log) = RecordingDriver::new();
        let (manager, _events) = SessionManager::new(driver, StallingPlatform, StateChannel::new());
        let config = PeripheralConfig::new().with_start_timeout(Duration::from_millis(50));
        let mut manager = manager.with_config(&config);

        let err = manager.start(AdvertiseData::new()).await.unwrap_err();
        assert!(matches!(err, PeripheralError::AdapterUnavailable(_)));
        assert!(log.lock().unwrap().starts.is_empty());

        assert!(!manager.is_supported().await);
        assert_eq!(manager.execute(HostCommand::IsSupported).await, Ok(CommandReply::Bool(false)));
        assert_eq!(manager.channel().current(), AdvertisingState::Idle);
    }

    #[tokio::test]
    async fn test_lost_broadcast_publishes_idle() {
        let (driver, _log) = RecordingDriver::new();
        let (manager, _events) = manager(driver, true);

        manager.handle_driver_event(DriverEvent::Started);
        assert_eq!(manager.handle_driver_event(DriverEvent::Stopped), AdvertisingState::Idle);
        assert!(!manager.is_advertising());
    }
}
