//! Error types for the peripheral session

use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors surfaced to the host by the peripheral session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeripheralError {
    #[error("BLE peripheral advertising is not supported on this platform")]
    UnsupportedPlatform,

    #[error("Bluetooth adapter unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid service UUID: {0}")]
    InvalidUuid(String),

    #[error("Radio driver error: {0}")]
    Driver(String),

    #[error("Failed to open Bluetooth settings: {0}")]
    Settings(String),

    #[error("Peripheral session closed")]
    SessionClosed,
}

/// Result type for peripheral operations
pub type Result<T> = std::result::Result<T, PeripheralError>;
