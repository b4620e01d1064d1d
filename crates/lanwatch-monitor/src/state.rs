//! Durable snapshot persistence.
//!
//! The snapshot (last-known device set plus last-scan time) is the only
//! persisted state. It is replaced wholesale via write-to-temp-then-rename,
//! so readers never observe a partial file. Loading tolerates two schema
//! generations: the current IP-keyed shape and a legacy MAC-keyed shape
//! that is migrated structurally on read.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use lanwatch_core::{Device, DeviceSet, Snapshot};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Loads and saves the device snapshot at a fixed path.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last persisted snapshot.
    ///
    /// A missing file is the normal first-run case and yields an empty
    /// snapshot silently; an unreadable or unparseable file yields an empty
    /// snapshot with a warning.
    pub fn load(&self) -> Snapshot {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Snapshot::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "State file unreadable");
                return Snapshot::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => decode_snapshot(&value),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "State file corrupt");
                Snapshot::default()
            }
        }
    }

    /// Persist the current device set with a now-timestamp.
    ///
    /// Writes to `<path>.tmp` first and renames into place. The caller
    /// treats an error as a recoverable, counted failure.
    pub fn save(&self, devices: &DeviceSet) -> Result<(), StateError> {
        let snapshot = Snapshot::new(devices.clone(), Utc::now());
        let json = serde_json::to_string_pretty(&snapshot)?;

        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

/// Structural snapshot decoder covering both schema generations.
///
/// Legacy files key `devices` by MAC with the IP inside the value
/// (`{mac: {"ip":…, "last_seen":…}}`); current files key by IP
/// (`{ip: {"mac":…, "last_seen":…}}`). The shape is detected by inspecting
/// the first value for an `"ip"` field, transformed once, and everything
/// downstream sees IP-keyed data.
fn decode_snapshot(value: &Value) -> Snapshot {
    let last_scan = value
        .get("last_scan")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    let mut devices = DeviceSet::new();
    let Some(map) = value.get("devices").and_then(Value::as_object) else {
        return Snapshot { devices, last_scan };
    };

    let legacy_mac_keyed = map
        .values()
        .next()
        .map(|entry| entry.get("ip").is_some())
        .unwrap_or(false);

    for (key, entry) in map {
        let last_seen = entry
            .get("last_seen")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);

        if legacy_mac_keyed {
            let Some(ip) = entry.get("ip").and_then(Value::as_str) else {
                continue;
            };
            devices.insert(ip.to_string(), Device::new(key.clone(), last_seen));
        } else {
            let mac = entry
                .get("mac")
                .and_then(Value::as_str)
                .unwrap_or(Device::UNKNOWN_MAC);
            devices.insert(key.clone(), Device::new(mac, last_seen));
        }
    }

    Snapshot { devices, last_scan }
}

/// Parse RFC-3339 or naive ISO-8601 (older files carry no offset).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
