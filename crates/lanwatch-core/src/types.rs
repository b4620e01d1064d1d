//! Core domain types for the lanwatch monitor.
//!
//! A scan observes hosts by IP; the hardware address is informational and
//! may be unknown without affecting host identity.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A host observed as present on the network.
///
/// The IP is the key of the containing [`DeviceSet`], never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Hardware address, uppercase colon-separated hex, or [`Device::UNKNOWN_MAC`].
    pub mac: String,
    /// Timestamp of the scan that last observed this host.
    pub last_seen: DateTime<Utc>,
}

impl Device {
    /// Sentinel for a link address that could not be resolved.
    pub const UNKNOWN_MAC: &'static str = "UNKNOWN";

    pub fn new(mac: impl Into<String>, last_seen: DateTime<Utc>) -> Self {
        Self {
            mac: mac.into(),
            last_seen,
        }
    }

    /// A device whose link address could not be resolved.
    pub fn unknown_mac(last_seen: DateTime<Utc>) -> Self {
        Self::new(Self::UNKNOWN_MAC, last_seen)
    }

    pub fn has_known_mac(&self) -> bool {
        self.mac != Self::UNKNOWN_MAC
    }
}

/// All devices believed present at a point in time, keyed by IP.
///
/// Two sets are compared by key membership only; MAC differences between
/// entries with the same IP are never significant.
pub type DeviceSet = BTreeMap<String, Device>;

/// The sole persisted state: the last-known device set and scan time.
///
/// Read at the start of every cycle, replaced wholesale at the end of every
/// cycle. An absent or unreadable snapshot degrades to `Snapshot::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub devices: DeviceSet,
    pub last_scan: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(devices: DeviceSet, last_scan: DateTime<Utc>) -> Self {
        Self {
            devices,
            last_scan: Some(last_scan),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_unknown_mac_sentinel() {
        let d = Device::unknown_mac(Utc::now());
        assert_eq!(d.mac, "UNKNOWN");
        assert!(!d.has_known_mac());
    }

    #[test]
    fn snapshot_serializes_ip_keyed() {
        let mut devices = DeviceSet::new();
        devices.insert(
            "192.168.1.5".to_string(),
            Device::new("AA:BB:CC:DD:EE:FF", Utc::now()),
        );
        let snapshot = Snapshot::new(devices, Utc::now());

        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value["devices"]["192.168.1.5"]["mac"].is_string());
        assert!(value["devices"]["192.168.1.5"]["last_seen"].is_string());
        assert!(value["last_scan"].is_string());
    }

    #[test]
    fn empty_snapshot_has_no_last_scan() {
        let snapshot = Snapshot::default();
        assert!(snapshot.is_empty());
        assert!(snapshot.last_scan.is_none());
    }
}
