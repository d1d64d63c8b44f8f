//! Typed host command surface
//!
//! Hosts speak in named method calls with a loosely-typed argument map.
//! Conversion into [`HostCommand`] happens here, at the boundary, so the
//! session manager only ever sees typed requests.

use serde_json::Value;

use crate::data::AdvertiseData;
use crate::error::{PeripheralError, Result};

/// Request issued by the host application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Start(AdvertiseData),
    Stop,
    IsAdvertising,
    IsSupported,
    IsConnected,
    OpenBluetoothSettings,
}

/// Reply to a [`HostCommand`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandReply {
    Done,
    Bool(bool),
}

impl HostCommand {
    /// Convert a named method call into a typed command
    pub fn from_method_call(method: &str, args: Option<&Value>) -> Result<Self> {
        match method {
            "start" => Ok(HostCommand::Start(AdvertiseData::from_arguments(args))),
            "stop" => Ok(HostCommand::Stop),
            "isAdvertising" => Ok(HostCommand::IsAdvertising),
            "isSupported" => Ok(HostCommand::IsSupported),
            "isConnected" => Ok(HostCommand::IsConnected),
            "openBluetoothSettings" => Ok(HostCommand::OpenBluetoothSettings),
            other => Err(PeripheralError::UnknownCommand(other.to_string())),
        }
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            HostCommand::Start(_) => "start",
            HostCommand::Stop => "stop",
            HostCommand::IsAdvertising => "isAdvertising",
            HostCommand::IsSupported => "isSupported",
            HostCommand::IsConnected => "isConnected",
            HostCommand::OpenBluetoothSettings => "openBluetoothSettings",
        }
    }
}

impl CommandReply {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CommandReply::Bool(value) => Some(*value),
            CommandReply::Done => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CommandReply::Done => Value::Null,
            CommandReply::Bool(value) => Value::Bool(*value),
        }
    }
}
