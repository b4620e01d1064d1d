//! Event types for host join/leave notifications.
//!
//! Events are created by the reconciler and consumed exactly once: appended
//! to the rotating event log and forwarded to the external sink. They are
//! never persisted beyond the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a host entered or exited the observed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Joined,
    Left,
}

impl EventKind {
    /// Label used in the event log line format.
    pub fn log_label(self) -> &'static str {
        match self {
            Self::Joined => "VERBUNDEN",
            Self::Left => "GETRENNT",
        }
    }

    /// Verb used in sink messages.
    pub fn sink_verb(self) -> &'static str {
        match self {
            Self::Joined => "anmeldung",
            Self::Left => "abmeldung",
        }
    }
}

/// A single join/leave observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEvent {
    pub kind: EventKind,
    pub ip: String,
    pub mac: String,
    pub timestamp: DateTime<Utc>,
}

impl HostEvent {
    pub fn new(kind: EventKind, ip: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            kind,
            ip: ip.into(),
            mac: mac.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_wire_format() {
        assert_eq!(EventKind::Joined.log_label(), "VERBUNDEN");
        assert_eq!(EventKind::Left.log_label(), "GETRENNT");
        assert_eq!(EventKind::Joined.sink_verb(), "anmeldung");
        assert_eq!(EventKind::Left.sink_verb(), "abmeldung");
    }
}
