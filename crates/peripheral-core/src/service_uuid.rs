//! Service UUID parsing with Bluetooth SIG shorthand

use uuid::Uuid;

use crate::error::{PeripheralError, Result};

/// Bluetooth base UUID, `00000000-0000-1000-8000-00805F9B34FB`
pub const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805F9B34FB;

/// Expand a 16- or 32-bit assigned number against the base UUID
pub fn uuid_from_short(short: u32) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
}

/// Parse a service UUID given as a full UUID or as 4/8 hex digit shorthand
pub fn parse_service_uuid(text: &str) -> Result<Uuid> {
    let trimmed = text.trim();
    let is_short = matches!(trimmed.len(), 4 | 8) && trimmed.chars().all(|c| c.is_ascii_hexdigit());
    if is_short {
        return u32::from_str_radix(trimmed, 16)
            .map(uuid_from_short)
            .map_err(|_| PeripheralError::InvalidUuid(text.to_string()));
    }
    Uuid::parse_str(trimmed).map_err(|_| PeripheralError::InvalidUuid(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_uuid_expansion() {
        let heart_rate = parse_service_uuid("180D").unwrap();
        assert_eq!(heart_rate.to_string(), "0000180d-0000-1000-8000-00805f9b34fb");

        let wide = parse_service_uuid("0000180d").unwrap();
        assert_eq!(wide, heart_rate);
    }

    #[test]
    fn test_full_uuid_passthrough() {
        let text = "BF27730D-860A-4E09-889C-2D8B6A9E0FE7";
        let uuid = parse_service_uuid(text).unwrap();
        assert_eq!(uuid.to_string(), text.to_lowercase());
    }

    #[test]
    fn test_invalid_uuid() {
        assert!(matches!(parse_service_uuid("18G0"), Err(PeripheralError::InvalidUuid(_))));
        assert!(matches!(parse_service_uuid(""), Err(PeripheralError::InvalidUuid(_))));
        assert!(matches!(parse_service_uuid("12345"), Err(PeripheralError::InvalidUuid(_))));
    }
}
