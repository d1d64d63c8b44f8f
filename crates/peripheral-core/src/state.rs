//! Advertising state reported to the host

use std::fmt;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Advertising State
// ----------------------------------------------------------------------------

/// Current state of the local peripheral as confirmed by the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvertisingState {
    /// No advertising in progress and no central connected
    #[default]
    Idle,
    /// Broadcasting, no central connected
    Advertising,
    /// A central is connected
    Connected,
    /// The adapter is disabled until it is re-enabled externally
    PoweredOff,
}

impl AdvertisingState {
    pub const ALL: [AdvertisingState; 4] = [
        AdvertisingState::Idle,
        AdvertisingState::Advertising,
        AdvertisingState::Connected,
        AdvertisingState::PoweredOff,
    ];

    /// Wire tag delivered on the event surface
    pub fn tag(&self) -> &'static str {
        match self {
            AdvertisingState::Idle => "idle",
            AdvertisingState::Advertising => "advertising",
            AdvertisingState::Connected => "connected",
            AdvertisingState::PoweredOff => "poweredOff",
        }
    }

    /// Stable integer index for hosts that prefer numeric tags
    pub fn index(&self) -> u8 {
        match self {
            AdvertisingState::Idle => 0,
            AdvertisingState::Advertising => 1,
            AdvertisingState::Connected => 2,
            AdvertisingState::PoweredOff => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.tag() == tag)
    }
}

impl fmt::Display for AdvertisingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
