//! Active-subnet resolution.
//!
//! The monitor needs a /24 base ("192.168.178") before it can sweep. It is
//! taken from the CLI/config when given, otherwise extracted from the local
//! interface configuration. Failure here is the one fatal error of the
//! whole program.

use std::time::Duration;

use regex::Regex;
use tokio::process::Command;

use crate::error::{MonitorError, Result};

const IFCONFIG_TIMEOUT: Duration = Duration::from_secs(5);

/// Normalize a subnet expression to its /24 base.
///
/// Accepts CIDR ("192.168.178.0/24"), a dotted quad ("192.168.178.0") or a
/// bare three-octet base ("192.168.178").
pub fn normalize_subnet(subnet: &str) -> Option<String> {
    let subnet = subnet.trim();
    if subnet.is_empty() {
        return None;
    }

    if subnet.contains('/') {
        let net: ipnet::Ipv4Net = subnet.parse().ok()?;
        let octets = net.network().octets();
        return Some(format!("{}.{}.{}", octets[0], octets[1], octets[2]));
    }

    let parts: Vec<&str> = subnet.split('.').collect();
    if parts.len() < 3 || parts.len() > 4 {
        return None;
    }
    if !parts.iter().all(|p| p.parse::<u8>().is_ok()) {
        return None;
    }
    Some(parts[..3].join("."))
}

/// Discover the /24 base from the local interface configuration.
///
/// Shells out to the platform's interface listing and takes the first
/// non-loopback IPv4 address found in the output.
pub async fn discover_subnet() -> Result<String> {
    let output = tokio::time::timeout(IFCONFIG_TIMEOUT, interface_command().output())
        .await
        .map_err(|_| MonitorError::SubnetUnresolved)?
        .map_err(MonitorError::Io)?;

    let text = String::from_utf8_lossy(&output.stdout);
    extract_subnet_base(&text).ok_or(MonitorError::SubnetUnresolved)
}

#[cfg(target_os = "windows")]
fn interface_command() -> Command {
    Command::new("ipconfig")
}

#[cfg(not(target_os = "windows"))]
fn interface_command() -> Command {
    let mut cmd = Command::new("ip");
    cmd.args(["addr", "show"]);
    cmd
}

/// Pull the first plausible /24 base out of interface-listing text,
/// skipping loopback.
fn extract_subnet_base(output: &str) -> Option<String> {
    let re = Regex::new(r"(\d{1,3}\.\d{1,3}\.\d{1,3})\.\d{1,3}").ok()?;
    for caps in re.captures_iter(output) {
        let base = &caps[1];
        if base.starts_with("127.") {
            continue;
        }
        if base.split('.').all(|p| p.parse::<u8>().is_ok()) {
            return Some(base.to_string());
        }
    }
    None
}
