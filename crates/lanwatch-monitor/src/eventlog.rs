//! Append-only event log with size-based rotation, plus the emitter that
//! fans each event out to the log, the tracing stream, and the sink.
//!
//! The local log append is the durability guarantee of record; the sink
//! forward is best-effort. Neither path may ever abort a scan cycle.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};

use lanwatch_core::{Device, HostEvent};
use lanwatch_sink::EventSink;

/// Render a timestamp the way log lines and sink messages expect it.
pub fn display_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// One event as a log line: `[ts] <VERBUNDEN|GETRENNT>: IP=<ip> MAC=<mac>`.
pub fn format_event_line(event: &HostEvent) -> String {
    format!(
        "[{}] {}: IP={} MAC={}",
        display_timestamp(event.timestamp),
        event.kind.log_label(),
        event.ip,
        event.mac,
    )
}

/// Sink message for one event; the MAC is omitted when unknown.
pub fn format_sink_message(event: &HostEvent) -> String {
    let stamp = display_timestamp(event.timestamp);
    let verb = event.kind.sink_verb();
    if event.mac == Device::UNKNOWN_MAC {
        format!("IP={} {verb} [{stamp}]", event.ip)
    } else {
        format!("IP={} MAC={} {verb} [{stamp}]", event.ip, event.mac)
    }
}

/// Append-only log file that rotates once it reaches a size threshold.
pub struct EventLog {
    path: PathBuf,
    max_size_bytes: u64,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>, max_size_kb: u64) -> Self {
        Self {
            path: path.into(),
            max_size_bytes: max_size_kb * 1024,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event line, rotating first if the file is at or above
    /// the threshold. A failed rotation is logged and the append still
    /// proceeds against the oversized file.
    pub fn append(&self, event: &HostEvent) -> std::io::Result<()> {
        if let Err(e) = self.rotate_if_needed() {
            tracing::warn!(path = %self.path.display(), error = %e, "Log rotation failed");
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", format_event_line(event))?;
        Ok(())
    }

    /// Rename the current file to `<stem>_<YYYYmmdd_HHMMSS><.ext>` when it
    /// has reached the threshold, so the next append starts a fresh log.
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if size < self.max_size_bytes {
            return Ok(());
        }

        let backup = self.backup_path(Local::now().format("%Y%m%d_%H%M%S").to_string());
        fs::rename(&self.path, &backup)?;
        tracing::info!(
            from = %self.path.display(),
            to = %backup.display(),
            size,
            "Rotated event log"
        );
        Ok(())
    }

    fn backup_path(&self, stamp: String) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("events");
        let name = match self.path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}_{stamp}.{ext}"),
            None => format!("{stem}_{stamp}"),
        };
        match self.path.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// Fans one event out to every consumer. Infallible by contract.
pub struct EventEmitter {
    log: EventLog,
    sink: EventSink,
}

impl EventEmitter {
    pub fn new(log: EventLog, sink: EventSink) -> Self {
        Self { log, sink }
    }

    pub async fn emit(&self, event: &HostEvent) {
        tracing::info!(
            kind = event.kind.log_label(),
            ip = %event.ip,
            mac = %event.mac,
            "Host event"
        );

        if let Err(e) = self.log.append(event) {
            tracing::warn!(
                path = %self.log.path().display(),
                error = %e,
                "Event log append failed"
            );
        }

        self.sink.insert(&format_sink_message(event)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanwatch_core::EventKind;
    use tempfile::tempdir;

    fn event(kind: EventKind, ip: &str, mac: &str) -> HostEvent {
        HostEvent::new(kind, ip, mac)
    }

    #[test]
    fn line_format_matches_contract() {
        let ev = event(EventKind::Joined, "192.168.178.9", "AA:BB:CC:DD:EE:FF");
        let line = format_event_line(&ev);
        assert!(line.ends_with("VERBUNDEN: IP=192.168.178.9 MAC=AA:BB:CC:DD:EE:FF"));
        assert!(line.starts_with('['));

        let ev = event(EventKind::Left, "192.168.178.9", Device::UNKNOWN_MAC);
        assert!(format_event_line(&ev).contains("GETRENNT: IP=192.168.178.9 MAC=UNKNOWN"));
    }

    #[test]
    fn sink_message_omits_unknown_mac() {
        let ev = event(EventKind::Joined, "10.0.0.5", "AA:BB:CC:DD:EE:FF");
        assert!(format_sink_message(&ev).starts_with("IP=10.0.0.5 MAC=AA:BB:CC:DD:EE:FF anmeldung"));

        let ev = event(EventKind::Left, "10.0.0.5", Device::UNKNOWN_MAC);
        let msg = format_sink_message(&ev);
        assert!(msg.starts_with("IP=10.0.0.5 abmeldung"));
        assert!(!msg.contains("MAC="));
    }

    #[test]
    fn append_creates_and_extends_log() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path().join("events.log"), 500);

        log.append(&event(EventKind::Joined, "10.0.0.1", "AA:BB:CC:DD:EE:FF"))
            .unwrap();
        log.append(&event(EventKind::Left, "10.0.0.1", "AA:BB:CC:DD:EE:FF"))
            .unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn rotation_preserves_old_content_and_starts_fresh() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path().join("events.log"), 1);

        // Push the file past the 1 KB threshold.
        while fs::metadata(log.path()).map(|m| m.len()).unwrap_or(0) < 1024 {
            log.append(&event(EventKind::Joined, "10.0.0.1", "AA:BB:CC:DD:EE:FF"))
                .unwrap();
        }
        let old_content = fs::read_to_string(log.path()).unwrap();

        // The next append rotates first, then writes the newest entry alone.
        log.append(&event(EventKind::Left, "10.0.0.99", Device::UNKNOWN_MAC))
            .unwrap();

        let fresh = fs::read_to_string(log.path()).unwrap();
        assert_eq!(fresh.lines().count(), 1);
        assert!(fresh.contains("IP=10.0.0.99"));

        let backup = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("events_") && n.ends_with(".log"))
            })
            .expect("rotated backup exists");
        assert_eq!(fs::read_to_string(backup).unwrap(), old_content);
    }

    #[test]
    fn no_rotation_below_threshold() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path().join("events.log"), 500);

        log.append(&event(EventKind::Joined, "10.0.0.1", "AA:BB:CC:DD:EE:FF"))
            .unwrap();
        log.append(&event(EventKind::Joined, "10.0.0.2", "AA:BB:CC:DD:EE:00"))
            .unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
    }
}
