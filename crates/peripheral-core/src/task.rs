//! Session task and handle
//!
//! Host calls and driver callbacks arrive on different execution contexts.
//! [`SessionTask`] is the single owner of the [`SessionManager`]: both kinds of
//! input are passed to it as messages and processed one at a time, so state
//! mutations are serialized without locks spread across the manager.
//! [`SessionHandle`] is the cloneable host-side front end.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::channel::{StateChannel, StateReceiver};
use crate::command::{CommandReply, HostCommand};
use crate::config::PeripheralConfig;
use crate::data::AdvertiseData;
use crate::driver::{AdvertisingDriver, DriverEventReceiver, Platform};
use crate::error::{PeripheralError, Result};
use crate::session::SessionManager;
use crate::state::AdvertisingState;

enum SessionRequest {
    Execute {
        command: HostCommand,
        reply: oneshot::Sender<Result<CommandReply>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

// ----------------------------------------------------------------------------
// Session Task
// ----------------------------------------------------------------------------

/// Task that owns the session manager and serializes all of its input
pub struct SessionTask<D, P> {
    manager: SessionManager<D, P>,
    requests: mpsc::Receiver<SessionRequest>,
    driver_events: DriverEventReceiver,
    driver_events_open: bool,
}

impl<D, P> SessionTask<D, P>
where
    D: AdvertisingDriver + 'static,
    P: Platform + 'static,
{
    /// Create the task for `manager` together with its host handle
    pub fn new(
        manager: SessionManager<D, P>,
        driver_events: DriverEventReceiver,
        config: &PeripheralConfig,
    ) -> (Self, SessionHandle) {
        let (requests_tx, requests_rx) = mpsc::channel(config.request_buffer_size.max(1));
        let handle = SessionHandle {
            requests: requests_tx,
            channel: manager.channel().clone(),
        };
        let task = Self {
            manager: manager.with_config(config),
            requests: requests_rx,
            driver_events,
            driver_events_open: true,
        };
        (task, handle)
    }

    /// Build a manager around `driver` and spawn its task on the current runtime
    pub fn spawn(driver: D, platform: P, config: &PeripheralConfig) -> (SessionHandle, JoinHandle<()>) {
        let (manager, driver_events) = SessionManager::new(driver, platform, StateChannel::new());
        let (task, handle) = Self::new(manager, driver_events, config);
        (handle, tokio::spawn(task.run()))
    }

    /// Process driver events and host requests until shut down
    ///
    /// Pending driver events are drained before the next host request, so a
    /// query always reflects every event the driver has already reported.
    pub async fn run(mut self) {
        info!("Peripheral session task starting");

        loop {
            tokio::select! {
                biased;

                event = self.driver_events.recv(), if self.driver_events_open => {
                    match event {
                        Some(event) => {
                            self.manager.handle_driver_event(event);
                        }
                        None => {
                            debug!("Driver event channel closed");
                            self.driver_events_open = false;
                        }
                    }
                }

                request = self.requests.recv() => {
                    match request {
                        Some(SessionRequest::Execute { command, reply }) => {
                            debug!("Host command {}", command.method_name());
                            let result = self.manager.execute(command).await;
                            // The caller may have given up waiting.
                            let _ = reply.send(result);
                        }
                        Some(SessionRequest::Shutdown { reply }) => {
                            self.manager.stop().await;
                            let _ = reply.send(());
                            break;
                        }
                        None => {
                            info!("All session handles dropped, shutting down");
                            self.manager.stop().await;
                            break;
                        }
                    }
                }
            }
        }

        info!("Peripheral session task stopped");
    }
}

// ----------------------------------------------------------------------------
// Session Handle
// ----------------------------------------------------------------------------

/// Host-side handle to a running [`SessionTask`]
#[derive(Clone, Debug)]
pub struct SessionHandle {
    requests: mpsc::Sender<SessionRequest>,
    channel: StateChannel,
}

impl SessionHandle {
    /// Run a typed command on the session task
    pub async fn execute(&self, command: HostCommand) -> Result<CommandReply> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(SessionRequest::Execute { command, reply })
            .await
            .map_err(|_| PeripheralError::SessionClosed)?;
        response.await.map_err(|_| PeripheralError::SessionClosed)?
    }

    /// Dispatch a named method call with a loosely-typed argument map
    pub async fn method_call(&self, method: &str, args: Option<&Value>) -> Result<Value> {
        let command = HostCommand::from_method_call(method, args)?;
        self.execute(command).await.map(|reply| reply.to_json())
    }

    pub async fn start(&self, data: AdvertiseData) -> Result<()> {
        self.execute(HostCommand::Start(data)).await.map(|_| ())
    }

    pub async fn stop(&self) -> Result<()> {
        self.execute(HostCommand::Stop).await.map(|_| ())
    }

    pub async fn is_supported(&self) -> Result<bool> {
        let reply = self.execute(HostCommand::IsSupported).await?;
        Ok(reply.as_bool().unwrap_or(false))
    }

    pub async fn open_bluetooth_settings(&self) -> Result<()> {
        self.execute(HostCommand::OpenBluetoothSettings).await.map(|_| ())
    }

    pub fn is_advertising(&self) -> bool {
        self.channel.current() == AdvertisingState::Advertising
    }

    pub fn is_connected(&self) -> bool {
        self.channel.current() == AdvertisingState::Connected
    }

    pub fn current_state(&self) -> AdvertisingState {
        self.channel.current()
    }

    /// See [`StateChannel::subscribe`]
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(AdvertisingState) + Send + 'static,
    {
        self.channel.subscribe(callback)
    }

    /// See [`StateChannel::subscribe_stream`]
    pub fn subscribe_stream(&self) -> StateReceiver {
        self.channel.subscribe_stream()
    }

    pub fn unsubscribe(&self) {
        self.channel.unsubscribe()
    }

    /// Stop advertising and end the session task
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.requests
            .send(SessionRequest::Shutdown { reply })
            .await
            .map_err(|_| PeripheralError::SessionClosed)?;
        done.await.map_err(|_| PeripheralError::SessionClosed)
    }
}
