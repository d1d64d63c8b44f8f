//! Command handlers for the peripheral CLI

use peripheral_core::AdvertiseData;
use tracing::info;

use crate::app::PeripheralApp;
use crate::cli::Commands;
use crate::error::Result;
use crate::interactive;

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command, then shut the session down
    pub async fn execute(command: Commands, app: PeripheralApp) -> Result<()> {
        let outcome = match command {
            Commands::Advertise {
                name,
                service_uuid,
                uuids,
            } => Self::handle_advertise_command(&app, advertise_data(name, service_uuid, uuids)).await,
            Commands::Status => Self::handle_status_command(&app).await,
            Commands::Settings => Self::handle_settings_command(&app).await,
            Commands::Interactive => interactive::run(&app).await,
        };
        app.shutdown().await?;
        outcome
    }

    /// Advertise and print state changes until Ctrl-C
    async fn handle_advertise_command(app: &PeripheralApp, data: AdvertiseData) -> Result<()> {
        let session = app.session();
        let mut states = session.subscribe_stream();

        session.start(data).await?;
        info!("Advertising requested, press Ctrl-C to stop");

        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);
        loop {
            tokio::select! {
                state = states.recv() => match state {
                    Some(state) => println!("state: {}", state),
                    None => break,
                },
                _ = &mut interrupted => {
                    info!("Interrupted, stopping advertising");
                    break;
                }
            }
        }

        session.unsubscribe();
        session.stop().await?;
        Ok(())
    }

    async fn handle_status_command(app: &PeripheralApp) -> Result<()> {
        let session = app.session();
        let supported = session.is_supported().await?;
        println!("peripheral supported: {}", supported);
        println!("state: {}", session.current_state());
        Ok(())
    }

    async fn handle_settings_command(app: &PeripheralApp) -> Result<()> {
        app.session().open_bluetooth_settings().await?;
        Ok(())
    }
}

/// Build advertisement data from CLI arguments, leaving absent fields out
pub fn advertise_data(name: Option<String>, service_uuid: Option<String>, uuids: Vec<String>) -> AdvertiseData {
    AdvertiseData {
        service_uuid,
        local_name: name,
        service_uuids: (!uuids.is_empty()).then_some(uuids),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advertise_data_omits_absent_fields() {
        assert_eq!(advertise_data(None, None, Vec::new()), AdvertiseData::default());

        let data = advertise_data(Some("Node".to_string()), None, vec!["180F".to_string()]);
        assert_eq!(data.local_name.as_deref(), Some("Node"));
        assert_eq!(data.service_uuid, None);
        assert_eq!(data.service_uuids, Some(vec!["180F".to_string()]));
    }
}
