//! OS neighbor-cache reader.
//!
//! Invokes `arp -a` and extracts `(ip, mac)` pairs from its output. The
//! format differs per platform (Windows uses `-`-separated MACs and table
//! headers, Unix prints `? (ip) at mac [ether] on dev` lines), so parsing
//! is line-wise pattern extraction rather than a fixed grammar. IP presence
//! is authoritative; the MAC is best-effort and degrades to the UNKNOWN
//! sentinel when a link-address token cannot be normalized.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use tokio::process::Command;

use lanwatch_core::{Device, DeviceSet};

const ARP_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure classes for a neighbor-table read. The sweep coordinator turns
/// any of these into an empty device set for the cycle.
#[derive(Debug, thiserror::Error)]
pub enum NeighborError {
    #[error("failed to invoke arp: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("arp invocation timed out after {0:?}")]
    Timeout(Duration),
}

/// Read the OS neighbor cache and return the devices it lists.
pub async fn read_neighbor_table() -> Result<DeviceSet, NeighborError> {
    let output = tokio::time::timeout(ARP_TIMEOUT, Command::new("arp").arg("-a").output())
        .await
        .map_err(|_| NeighborError::Timeout(ARP_TIMEOUT))??;

    let text = String::from_utf8_lossy(&output.stdout);
    Ok(parse_neighbor_output(&text, Utc::now()))
}

/// Extract devices from neighbor-cache text.
///
/// A line contributes a device when it carries an IPv4 address and a
/// MAC-shaped token. Broadcast entries are dropped entirely; tokens that
/// look like a MAC but do not normalize keep the IP with an UNKNOWN MAC.
/// Lines without any MAC-shaped token (table headers, incomplete entries)
/// are skipped.
pub fn parse_neighbor_output(output: &str, now: DateTime<Utc>) -> DeviceSet {
    static IP_RE: OnceLock<Regex> = OnceLock::new();
    static MAC_RE: OnceLock<Regex> = OnceLock::new();
    let ip_re = IP_RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\b").expect("static regex")
    });
    let mac_re = MAC_RE.get_or_init(|| {
        Regex::new(r"\b([0-9A-Fa-f]{1,2}(?:[:-][0-9A-Fa-f]{1,2})+)\b").expect("static regex")
    });

    let mut devices = DeviceSet::new();

    for line in output.lines() {
        let Some(ip_caps) = ip_re.captures(line) else {
            continue;
        };
        let ip = &ip_caps[1];
        if !is_valid_ipv4(ip) {
            continue;
        }

        let rest = &line[ip_caps.get(0).expect("whole match").end()..];
        let Some(mac_caps) = mac_re.captures(rest) else {
            continue;
        };

        let device = match normalize_mac(&mac_caps[1]) {
            Some(mac) if is_broadcast(&mac) => continue,
            Some(mac) => Device::new(mac, now),
            None => Device::unknown_mac(now),
        };
        devices.insert(ip.to_string(), device);
    }

    devices
}

/// Normalize a raw link-address token to uppercase colon-separated hex.
/// Returns `None` unless the token has exactly six hex groups.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let groups: Vec<&str> = raw.split([':', '-']).collect();
    if groups.len() != 6 {
        return None;
    }

    let mut bytes = Vec::with_capacity(6);
    for group in groups {
        bytes.push(u8::from_str_radix(group, 16).ok()?);
    }

    Some(
        bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":"),
    )
}

fn is_broadcast(mac: &str) -> bool {
    mac.starts_with("FF:")
}

fn is_valid_ipv4(ip: &str) -> bool {
    ip.parse::<std::net::Ipv4Addr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_windows_format() {
        let output = "\
Schnittstelle: 192.168.178.42 --- 0x5
  Internetadresse       Physische Adresse     Typ
  192.168.178.1         44-4e-6d-11-22-33     dynamisch
  192.168.178.21        a8-5e-45-ab-cd-ef     dynamisch
  192.168.178.255       ff-ff-ff-ff-ff-ff     statisch
";
        let devices = parse_neighbor_output(output, Utc::now());
        assert_eq!(devices.len(), 2);
        assert_eq!(devices["192.168.178.1"].mac, "44:4E:6D:11:22:33");
        assert_eq!(devices["192.168.178.21"].mac, "A8:5E:45:AB:CD:EF");
        // Broadcast entry dropped; the header line has no MAC token.
        assert!(!devices.contains_key("192.168.178.255"));
        assert!(!devices.contains_key("192.168.178.42"));
    }

    #[test]
    fn parses_unix_format() {
        let output = "\
fritz.box (192.168.178.1) at 44:4e:6d:11:22:33 [ether] on wlan0
? (192.168.178.30) at <incomplete> on wlan0
phone.local (192.168.178.77) at a8:5e:45:0:1:2 [ether] on wlan0
";
        let devices = parse_neighbor_output(output, Utc::now());
        assert_eq!(devices.len(), 2);
        assert_eq!(devices["192.168.178.1"].mac, "44:4E:6D:11:22:33");
        // Single-digit hex groups are padded.
        assert_eq!(devices["192.168.178.77"].mac, "A8:5E:45:00:01:02");
        assert!(!devices.contains_key("192.168.178.30"));
    }

    #[test]
    fn malformed_mac_keeps_ip_with_unknown() {
        let output = "  192.168.178.9         a8-5e-45-ab-cd-ef-99     dynamisch\n";
        let devices = parse_neighbor_output(output, Utc::now());
        assert_eq!(devices["192.168.178.9"].mac, Device::UNKNOWN_MAC);
    }

    #[test]
    fn invalid_ip_octets_are_skipped() {
        let output = "  300.168.178.9         a8-5e-45-ab-cd-ef     dynamisch\n";
        assert!(parse_neighbor_output(output, Utc::now()).is_empty());
    }

    #[test]
    fn repeated_parses_reuse_compiled_patterns() {
        let output = "fritz.box (192.168.178.1) at 44:4e:6d:11:22:33 [ether] on wlan0\n";
        let first = parse_neighbor_output(output, Utc::now());
        let second = parse_neighbor_output(output, Utc::now());
        assert_eq!(first.len(), 1);
        assert_eq!(
            first.keys().collect::<Vec<_>>(),
            second.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn normalize_mac_variants() {
        assert_eq!(
            normalize_mac("a8-5e-45-ab-cd-ef").as_deref(),
            Some("A8:5E:45:AB:CD:EF")
        );
        assert_eq!(
            normalize_mac("0:1:2:3:4:5").as_deref(),
            Some("00:01:02:03:04:05")
        );
        assert!(normalize_mac("a8:5e:45").is_none());
        assert!(normalize_mac("a8:5e:45:ab:cd:ef:01").is_none());
        assert!(normalize_mac("zz:5e:45:ab:cd:ef").is_none());
    }
}
