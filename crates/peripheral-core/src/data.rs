//! Advertisement configuration supplied by the host

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::service_uuid::parse_service_uuid;

// ----------------------------------------------------------------------------
// Advertise Data
// ----------------------------------------------------------------------------

/// Configuration for one advertising session
///
/// Every field is optional; absent fields are left out of the advertisement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertiseData {
    /// Primary GATT service UUID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_uuid: Option<String>,
    /// Advertised device name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    /// Additional service UUIDs, in advertisement order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_uuids: Option<Vec<String>>,
}

impl AdvertiseData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.service_uuid = Some(uuid.into());
        self
    }

    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = Some(name.into());
        self
    }

    pub fn with_service_uuids<I, S>(mut self, uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.service_uuids = Some(uuids.into_iter().map(Into::into).collect());
        self
    }

    /// Build from a loosely-typed argument map
    ///
    /// A field holding the wrong JSON type is treated as absent, and
    /// `serviceUuids` is absent unless every element is a string.
    pub fn from_arguments(args: Option<&Value>) -> Self {
        let Some(map) = args.and_then(Value::as_object) else {
            return Self::default();
        };

        let string_field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_owned);

        let service_uuids = map.get("serviceUuids").and_then(Value::as_array).and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
        });

        Self {
            service_uuid: string_field("serviceUuid"),
            local_name: string_field("localName"),
            service_uuids,
        }
    }

    /// All advertised service UUIDs, primary first, duplicates removed
    pub fn advertised_uuids(&self) -> Result<Vec<Uuid>> {
        let mut uuids: Vec<Uuid> = Vec::new();
        let extra = self.service_uuids.iter().flatten();
        for text in self.service_uuid.iter().chain(extra) {
            let uuid = parse_service_uuid(text)?;
            if !uuids.contains(&uuid) {
                uuids.push(uuid);
            }
        }
        Ok(uuids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PeripheralError;
    use serde_json::json;

    #[test]
    fn test_from_arguments_reads_all_fields() {
        let args = json!({
            "serviceUuid": "bf27730d-860a-4e09-889c-2d8b6a9e0fe7",
            "localName": "Sensor",
            "serviceUuids": ["180D", "180F"],
        });
        let data = AdvertiseData::from_arguments(Some(&args));

        assert_eq!(data.service_uuid.as_deref(), Some("bf27730d-860a-4e09-889c-2d8b6a9e0fe7"));
        assert_eq!(data.local_name.as_deref(), Some("Sensor"));
        assert_eq!(data.service_uuids, Some(vec!["180D".to_string(), "180F".to_string()]));
    }

    #[test]
    fn test_from_arguments_drops_mistyped_fields() {
        let args = json!({
            "serviceUuid": 42,
            "localName": "Sensor",
            "serviceUuids": ["180D", 7],
        });
        let data = AdvertiseData::from_arguments(Some(&args));

        assert_eq!(data.service_uuid, None);
        assert_eq!(data.local_name.as_deref(), Some("Sensor"));
        assert_eq!(data.service_uuids, None);
    }

    #[test]
    fn test_from_arguments_without_map() {
        assert_eq!(AdvertiseData::from_arguments(None), AdvertiseData::default());
        assert_eq!(
            AdvertiseData::from_arguments(Some(&json!("not a map"))),
            AdvertiseData::default()
        );
    }

    #[test]
    fn test_advertised_uuids_primary_first_and_deduplicated() {
        let data = AdvertiseData::new()
            .with_service_uuid("180D")
            .with_service_uuids(["180F", "0000180d-0000-1000-8000-00805f9b34fb"]);
        let uuids = data.advertised_uuids().unwrap();

        assert_eq!(uuids.len(), 2);
        assert_eq!(uuids[0], parse_service_uuid("180D").unwrap());
        assert_eq!(uuids[1], parse_service_uuid("180F").unwrap());
    }

    #[test]
    fn test_advertised_uuids_empty_when_absent() {
        assert!(AdvertiseData::new().advertised_uuids().unwrap().is_empty());
    }

    #[test]
    fn test_advertised_uuids_rejects_garbage() {
        let data = AdvertiseData::new().with_service_uuids(["not-a-uuid"]);
        assert_eq!(
            data.advertised_uuids(),
            Err(PeripheralError::InvalidUuid("not-a-uuid".to_string()))
        );
    }
}
