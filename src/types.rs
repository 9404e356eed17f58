use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Snapshot of one row of the `device` table.
///
/// The record keeps no handle to the store. Equality and hashing only look at
/// `uuid`, so two snapshots of the same device compare equal even if one of
/// them is stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub uuid: String,
    pub instance_name: Option<String>,
    pub last_host: Option<String>,
    pub last_seen: u32,
    pub account_username: Option<String>,
    pub last_lat: Option<f64>,
    pub last_lon: Option<f64>,
}

impl DeviceRecord {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            instance_name: None,
            last_host: None,
            last_seen: 0,
            account_username: None,
            last_lat: None,
            last_lon: None,
        }
    }

    /// Last reported position, only when both coordinates are known.
    pub fn last_location(&self) -> Option<(f64, f64)> {
        match (self.last_lat, self.last_lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(i64::from(self.last_seen), 0).single()
    }

    pub fn to_json(&self) -> crate::errors::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl PartialEq for DeviceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for DeviceRecord {}

impl Hash for DeviceRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;

    fn hash_of(record: &DeviceRecord) -> u64 {
        let mut hasher = DefaultHasher::new();
        record.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equality_uses_uuid_only() {
        let a = DeviceRecord {
            instance_name: Some("quest".to_string()),
            last_seen: 100,
            last_lat: Some(1.0),
            last_lon: Some(2.0),
            ..DeviceRecord::new("dev-1")
        };
        let b = DeviceRecord {
            last_host: Some("10.0.0.2".to_string()),
            account_username: Some("ash".to_string()),
            ..DeviceRecord::new("dev-1")
        };

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, DeviceRecord::new("dev-2"));

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_last_location_requires_both_halves() {
        let mut record = DeviceRecord::new("dev");
        assert_eq!(record.last_location(), None);

        record.last_lat = Some(51.5);
        assert_eq!(record.last_location(), None);

        record.last_lon = Some(-0.12);
        assert_eq!(record.last_location(), Some((51.5, -0.12)));
    }

    #[test]
    fn test_last_seen_at() {
        let record = DeviceRecord {
            last_seen: 1_600_000_000,
            ..DeviceRecord::new("dev")
        };
        assert_eq!(record.last_seen_at().unwrap().timestamp(), 1_600_000_000);
    }

    #[test]
    fn test_json_shape() {
        let record = DeviceRecord {
            instance_name: Some("pokestops".to_string()),
            last_seen: 42,
            last_lat: Some(10.5),
            ..DeviceRecord::new("dev-json")
        };

        let value = record.to_json().unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "uuid": "dev-json",
                "instance_name": "pokestops",
                "last_host": null,
                "last_seen": 42,
                "account_username": null,
                "last_lat": 10.5,
                "last_lon": null
            })
        );
    }
}
